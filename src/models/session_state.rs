use serde::Serialize;

/// Lifecycle state of a shift session.
///
/// "Unstarted" is the absence of a row: a session only exists once a
/// geofence-verified check-in has been accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Active,
    OnBreak,
    PendingCertification,
    Closed,
    Cancelled,
}

impl SessionState {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::OnBreak => "on_break",
            SessionState::PendingCertification => "pending_certification",
            SessionState::Closed => "closed",
            SessionState::Cancelled => "cancelled",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SessionState::Active),
            "on_break" => Some(SessionState::OnBreak),
            "pending_certification" => Some(SessionState::PendingCertification),
            "closed" => Some(SessionState::Closed),
            "cancelled" => Some(SessionState::Cancelled),
            _ => None,
        }
    }

    /// A session still occupying its (worker, assignment) slot.
    pub fn is_open(&self) -> bool {
        !matches!(self, SessionState::Closed | SessionState::Cancelled)
    }
}
