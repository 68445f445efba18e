//! Unified application error type.
//! All modules (db, core, cli, export) return AppError to keep error
//! handling consistent across the crate.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid break type: {0}")]
    InvalidBreakType(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Invalid event kind: {0}")]
    InvalidEventKind(String),

    // ---------------------------
    // Lookup errors
    // ---------------------------
    #[error("Assignment {0} not found")]
    AssignmentNotFound(i64),

    #[error("Session {0} not found")]
    SessionNotFound(i64),

    #[error("No active session for assignment {0}")]
    NoActiveSession(i64),

    // ---------------------------
    // Policy violations
    // ---------------------------
    #[error("Outside geofence: {distance_m:.1} m from site, radius {radius_m:.1} m")]
    OutsideGeofence { distance_m: f64, radius_m: f64 },

    #[error("Break already open for session {0}")]
    BreakAlreadyOpen(i64),

    #[error("No open break for session {0}")]
    NoOpenBreak(i64),

    #[error("Break in progress for session {0}: end it before checking out")]
    BreakInProgress(i64),

    #[error("Session {0} is not active")]
    SessionNotActive(i64),

    // ---------------------------
    // State conflicts
    // ---------------------------
    #[error("Session already active: session {id} is {state}")]
    SessionAlreadyActive { id: i64, state: String },

    #[error("Invalid transition: {command} is not allowed in state {state}")]
    InvalidTransition { state: String, command: String },

    #[error("Version conflict on session {id}: expected {expected}, current is {actual}")]
    VersionConflict { id: i64, expected: i64, actual: i64 },

    #[error("Stale event: {0}")]
    StaleEvent(String),

    #[error("Event with idempotency key '{0}' was already applied")]
    DuplicateEvent(String),

    // ---------------------------
    // Certification
    // ---------------------------
    #[error("Session {0} is not pending certification")]
    SessionNotPendingCertification(i64),

    #[error("Missing signature: a non-empty signer name is required")]
    MissingSignature,

    #[error("Certification requires an explicit attestation (--attested)")]
    MissingAttestation,

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export format not supported: {0}")]
    InvalidExportFormat(String),

    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
