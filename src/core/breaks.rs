//! Break ledger rules for a single shift session.
//!
//! Non-overlap follows from two checks: only one interval may be open at
//! a time, and a new start may not precede the latest closed end.

use crate::errors::{AppError, AppResult};
use crate::models::break_interval::BreakInterval;
use chrono::{DateTime, Utc};

/// The currently open interval, if any.
pub fn open_break(intervals: &[BreakInterval]) -> Option<&BreakInterval> {
    intervals.iter().find(|b| b.is_open())
}

/// Validate a break start against the session's existing intervals.
pub fn validate_start(
    session_id: i64,
    intervals: &[BreakInterval],
    at: DateTime<Utc>,
) -> AppResult<()> {
    if open_break(intervals).is_some() {
        return Err(AppError::BreakAlreadyOpen(session_id));
    }

    if let Some(last_end) = intervals.iter().filter_map(|b| b.ended_at).max()
        && at < last_end
    {
        return Err(AppError::StaleEvent(format!(
            "break start at {at} would overlap an interval closed at {last_end}"
        )));
    }

    Ok(())
}

/// Validate a break end; returns the open interval it closes.
pub fn validate_end(
    session_id: i64,
    intervals: &[BreakInterval],
    at: DateTime<Utc>,
) -> AppResult<&BreakInterval> {
    let open = open_break(intervals).ok_or(AppError::NoOpenBreak(session_id))?;

    if at < open.started_at {
        return Err(AppError::StaleEvent(format!(
            "break end at {at} precedes its start at {}",
            open.started_at
        )));
    }

    Ok(open)
}

/// Total payable break time: the sum of closed intervals only.
pub fn closed_minutes(intervals: &[BreakInterval]) -> i64 {
    intervals.iter().map(|b| b.closed_minutes()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::break_type::BreakType;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    fn interval(id: i64, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> BreakInterval {
        BreakInterval {
            id,
            session_id: 1,
            kind: BreakType::Meal,
            started_at: start,
            ended_at: end,
        }
    }

    #[test]
    fn start_fails_while_another_is_open() {
        let intervals = vec![interval(1, ts(12, 0), None)];
        let err = validate_start(1, &intervals, ts(12, 10)).unwrap_err();
        assert!(matches!(err, AppError::BreakAlreadyOpen(1)));
    }

    #[test]
    fn end_fails_with_none_open() {
        let intervals = vec![interval(1, ts(12, 0), Some(ts(12, 30)))];
        let err = validate_end(1, &intervals, ts(13, 0)).unwrap_err();
        assert!(matches!(err, AppError::NoOpenBreak(1)));
    }

    #[test]
    fn start_before_last_closed_end_is_stale() {
        let intervals = vec![interval(1, ts(12, 0), Some(ts(12, 30)))];
        let err = validate_start(1, &intervals, ts(12, 15)).unwrap_err();
        assert!(matches!(err, AppError::StaleEvent(_)));
    }

    #[test]
    fn sequential_intervals_are_accepted() {
        let intervals = vec![interval(1, ts(10, 0), Some(ts(10, 15)))];
        assert!(validate_start(1, &intervals, ts(12, 0)).is_ok());
    }

    #[test]
    fn open_interval_is_excluded_from_payable_minutes() {
        let intervals = vec![
            interval(1, ts(10, 0), Some(ts(10, 15))),
            interval(2, ts(12, 0), None),
        ];
        assert_eq!(closed_minutes(&intervals), 15);
    }

    #[test]
    fn end_resolves_the_open_interval() {
        let intervals = vec![
            interval(1, ts(10, 0), Some(ts(10, 15))),
            interval(2, ts(12, 0), None),
        ];
        let open = validate_end(1, &intervals, ts(12, 30)).unwrap();
        assert_eq!(open.id, 2);
    }
}
