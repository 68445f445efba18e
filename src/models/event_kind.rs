use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CheckIn,
    CheckOut,
    BreakStart,
    BreakEnd,
}

impl EventKind {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EventKind::CheckIn => "check_in",
            EventKind::CheckOut => "check_out",
            EventKind::BreakStart => "break_start",
            EventKind::BreakEnd => "break_end",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "check_in" => Some(EventKind::CheckIn),
            "check_out" => Some(EventKind::CheckOut),
            "break_start" => Some(EventKind::BreakStart),
            "break_end" => Some(EventKind::BreakEnd),
            _ => None,
        }
    }
}
