//! Formatting utilities used for CLI and export outputs.

use crate::core::geofence::meters_to_feet;

/// es: 7h 30m
pub fn fmt_minutes(mins: i64) -> String {
    let sign = if mins < 0 { "-" } else { "" };
    let m = mins.abs();
    format!("{}{}h {:02}m", sign, m / 60, m % 60)
}

/// Distance in the configured display unit ("feet" or "meters").
pub fn fmt_distance(meters: f64, unit: &str) -> String {
    if unit.eq_ignore_ascii_case("meters") {
        format!("{meters:.1} m")
    } else {
        format!("{:.0} ft", meters_to_feet(meters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_render_as_hours_and_minutes() {
        assert_eq!(fmt_minutes(450), "7h 30m");
        assert_eq!(fmt_minutes(-75), "-1h 15m");
        assert_eq!(fmt_minutes(0), "0h 00m");
    }

    #[test]
    fn distance_follows_display_unit() {
        assert_eq!(fmt_distance(76.2, "feet"), "250 ft");
        assert_eq!(fmt_distance(76.2, "meters"), "76.2 m");
    }
}
