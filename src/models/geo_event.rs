use super::event_kind::EventKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One device-submitted attendance event, immutable once persisted.
///
/// Rejected attempts are kept too (`accepted = false` plus a reason):
/// the ledger is the audit trail, and corrections are modeled as new
/// events, never in-place edits.
#[derive(Debug, Clone, Serialize)]
pub struct GeoEvent {
    pub id: i64,
    pub assignment_id: i64,
    /// None for check-in attempts rejected before a session existed.
    pub session_id: Option<i64>,
    pub kind: EventKind,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_m: Option<f64>,
    pub distance_m: Option<f64>,
    pub within_geofence: Option<bool>,
    /// Device-reported moment; authoritative for hours and replay order.
    pub client_time: DateTime<Utc>,
    pub server_time: DateTime<Utc>,
    pub idempotency_key: String,
    pub accepted: bool,
    pub reject_reason: String,
}

/// Insert shape for a new ledger row (id is assigned by SQLite).
#[derive(Debug, Clone)]
pub struct NewGeoEvent {
    pub assignment_id: i64,
    pub session_id: Option<i64>,
    pub kind: EventKind,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_m: Option<f64>,
    pub distance_m: Option<f64>,
    pub within_geofence: Option<bool>,
    pub client_time: DateTime<Utc>,
    pub idempotency_key: String,
    pub accepted: bool,
    pub reject_reason: String,
}
