//! Payable-hours projection, recomputed on read from the ledger.
//!
//! There is deliberately no stored "total hours" field anywhere: totals
//! are derived from the session clock and its closed break intervals, so
//! they can never drift from the source events.

use crate::core::breaks;
use crate::models::break_interval::BreakInterval;
use crate::models::session::ShiftSession;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy)]
pub struct PayableSummary {
    /// Gross clocked minutes (to `as_of` while the session is open).
    pub clocked_minutes: i64,
    /// Closed break minutes; an open break is excluded until it ends.
    pub break_minutes: i64,
    pub payable_minutes: i64,
}

impl PayableSummary {
    pub fn payable_hours(&self) -> f64 {
        self.payable_minutes as f64 / 60.0
    }
}

pub fn summarize(
    session: &ShiftSession,
    intervals: &[BreakInterval],
    as_of: DateTime<Utc>,
) -> PayableSummary {
    let clocked = session.clocked_minutes(as_of);
    let break_minutes = breaks::closed_minutes(intervals);
    PayableSummary {
        clocked_minutes: clocked,
        break_minutes,
        payable_minutes: (clocked - break_minutes).max(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::break_type::BreakType;
    use crate::models::session_state::SessionState;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    fn session(out: Option<DateTime<Utc>>) -> ShiftSession {
        ShiftSession {
            id: 1,
            assignment_id: 1,
            worker_id: "w-100".into(),
            state: SessionState::Active,
            clock_in_at: ts(9, 0),
            clock_out_at: out,
            version: 1,
            created_at: ts(9, 0),
        }
    }

    #[test]
    fn payable_is_clocked_minus_closed_breaks() {
        let intervals = vec![BreakInterval {
            id: 1,
            session_id: 1,
            kind: BreakType::Meal,
            started_at: ts(12, 0),
            ended_at: Some(ts(12, 30)),
        }];
        let s = summarize(&session(Some(ts(17, 30))), &intervals, ts(18, 0));
        assert_eq!(s.clocked_minutes, 510);
        assert_eq!(s.break_minutes, 30);
        assert_eq!(s.payable_minutes, 480);
        assert!((s.payable_hours() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn open_session_projects_to_as_of() {
        let s = summarize(&session(None), &[], ts(11, 15));
        assert_eq!(s.clocked_minutes, 135);
        assert_eq!(s.payable_minutes, 135);
    }

    #[test]
    fn open_break_does_not_reduce_payable_until_closed() {
        let intervals = vec![BreakInterval {
            id: 1,
            session_id: 1,
            kind: BreakType::Rest,
            started_at: ts(10, 0),
            ended_at: None,
        }];
        let s = summarize(&session(None), &intervals, ts(10, 20));
        assert_eq!(s.break_minutes, 0);
        assert_eq!(s.payable_minutes, 80);
    }
}
