use super::break_type::BreakType;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A break interval inside one shift session.
/// At most one interval per session has a null end.
#[derive(Debug, Clone, Serialize)]
pub struct BreakInterval {
    pub id: i64,
    pub session_id: i64,
    pub kind: BreakType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl BreakInterval {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Minutes of a closed interval; an open interval contributes nothing
    /// to payable-hours math until closed.
    pub fn closed_minutes(&self) -> i64 {
        match self.ended_at {
            Some(end) => (end - self.started_at).num_minutes().max(0),
            None => 0,
        }
    }
}
