use super::session_state::SessionState;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One worker's occupancy of one assignment, from verified check-in to
/// certified close. The row doubles as the materialized projection used
/// for fast reads; hours are always recomputed from the event ledger.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftSession {
    pub id: i64,
    pub assignment_id: i64,
    pub worker_id: String,
    pub state: SessionState,
    pub clock_in_at: DateTime<Utc>,
    pub clock_out_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency counter, bumped on every accepted mutation.
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl ShiftSession {
    /// Gross clocked minutes, using `as_of` while the session is still open.
    pub fn clocked_minutes(&self, as_of: DateTime<Utc>) -> i64 {
        let end = self.clock_out_at.unwrap_or(as_of);
        (end - self.clock_in_at).num_minutes().max(0)
    }
}
