use chrono::{DateTime, Utc};
use serde::Serialize;

/// The worker's attestation that recorded hours are accurate.
///
/// This is the payroll system's read contract: a session only reaches
/// Closed through exactly one of these rows.
#[derive(Debug, Clone, Serialize)]
pub struct Certification {
    pub id: i64,
    pub session_id: i64,
    pub attested_hours: f64,
    pub attested_break_count: i64,
    /// Engine-recomputed hours: clock_out − clock_in − closed breaks.
    pub computed_hours: f64,
    /// Non-fatal data-quality flag; the session closes either way and the
    /// discrepancy is routed to the review queue.
    pub hours_mismatch: bool,
    pub signer_name: String,
    pub signed_at: DateTime<Utc>,
}
