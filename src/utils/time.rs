//! Time utilities: RFC 3339 parsing and idempotency key generation.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn parse_timestamp(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidTimestamp(s.to_string()))
}

/// CLI `--at` flag: explicit timestamp, or the current instant.
pub fn parse_optional_timestamp(input: Option<&String>) -> AppResult<DateTime<Utc>> {
    match input {
        Some(s) => parse_timestamp(s),
        None => Ok(Utc::now()),
    }
}

/// Fallback key for live CLI submissions that carry no device key.
/// Nanosecond clock plus pid is unique enough for a single workstation;
/// synced batches always bring their own keys.
pub fn gen_idempotency_key(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}-{}", prefix, std::process::id(), nanos, seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset_to_utc() {
        let dt = parse_timestamp("2025-06-02T09:00:00-05:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap());
    }

    #[test]
    fn rejects_bare_dates() {
        assert!(matches!(
            parse_timestamp("2025-06-02"),
            Err(AppError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn generated_keys_differ() {
        let a = gen_idempotency_key("cli");
        let b = gen_idempotency_key("cli");
        assert_ne!(a, b);
    }
}
