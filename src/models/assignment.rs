use chrono::{DateTime, Utc};
use serde::Serialize;

/// Job assignment supplied by the scheduling collaborator.
///
/// Read-only for this core: we consume the worker pairing, the site
/// coordinates and the geofence radius, and never mutate them.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub worker_id: String,
    pub site_name: String,
    pub site_latitude: f64,
    pub site_longitude: f64,
    pub geofence_radius_m: f64,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
