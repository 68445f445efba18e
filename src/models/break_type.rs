use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakType {
    Meal,
    Rest,
}

impl BreakType {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BreakType::Meal => "meal",
            BreakType::Rest => "rest",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "meal" => Some(BreakType::Meal),
            "rest" => Some(BreakType::Rest),
            _ => None,
        }
    }

    /// Helper: convert input code from CLI (case-insensitive)
    pub fn from_code(code: &str) -> Option<Self> {
        BreakType::from_db_str(&code.to_lowercase())
    }
}
