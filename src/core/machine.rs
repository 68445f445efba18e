//! Shift session state machine.
//!
//! Transitions are all-or-nothing: the service layer only persists a new
//! state after `next_state` has accepted the command, so no partial state
//! mutation is ever observable. Guards that need data beyond the state
//! itself (geofence pass, open break, open-session uniqueness) live in
//! the service layer and run before the transition is committed.

use crate::errors::{AppError, AppResult};
use crate::models::session_state::SessionState;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    CheckIn,
    CheckOut,
    BreakStart,
    BreakEnd,
    Certify,
}

impl fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionCommand::CheckIn => "check_in",
            SessionCommand::CheckOut => "check_out",
            SessionCommand::BreakStart => "break_start",
            SessionCommand::BreakEnd => "break_end",
            SessionCommand::Certify => "certify",
        };
        f.write_str(s)
    }
}

/// Pure transition table for an existing session.
///
/// Check-in is never valid here: a session is created by the first
/// accepted check-in, and a second check-in against an open session is
/// answered with `SessionAlreadyActive` before this function is reached.
pub fn next_state(state: SessionState, command: SessionCommand) -> AppResult<SessionState> {
    use SessionCommand::*;
    use SessionState::*;

    match (state, command) {
        (Active, BreakStart) => Ok(OnBreak),
        (OnBreak, BreakEnd) => Ok(Active),
        (Active, CheckOut) => Ok(PendingCertification),
        (PendingCertification, Certify) => Ok(Closed),
        (s, c) => Err(AppError::InvalidTransition {
            state: s.to_db_str().to_string(),
            command: c.to_string(),
        }),
    }
}
