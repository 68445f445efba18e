// src/export/model.rs

use serde::Serialize;

/// Flat per-session payroll row.
///
/// `payable_hours` is recomputed from the ledger at export time, never
/// read back from a stored total.
#[derive(Serialize, Clone, Debug)]
pub struct PayrollExport {
    pub session_id: i64,
    pub assignment_id: i64,
    pub worker_id: String,
    pub site_name: String,
    pub state: String,
    pub clock_in: String,
    pub clock_out: String,
    pub break_minutes: i64,
    pub payable_minutes: i64,
    pub payable_hours: f64,
    pub certified: bool,
    pub signer_name: String,
    pub attested_hours: Option<f64>,
    pub hours_mismatch: bool,
}
