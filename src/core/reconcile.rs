//! Offline sync reconciliation.
//!
//! Devices queue events while disconnected and submit them in a batch
//! once back online. The reconciler replays the batch in client-time
//! order through the same validation path as live submissions, so a
//! synced batch can never produce a session a live device could not.
//!
//! Per-event outcomes are independent: one rejected event never blocks
//! the rest of the batch, and every rejection lands in the ledger as an
//! `accepted = 0` row.

use crate::core::service::{self, EventStamp, GeoPing};
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::break_type::BreakType;
use crate::models::event_kind::EventKind;
use crate::models::geo_event::NewGeoEvent;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One queued device event, as submitted in a sync batch (JSON).
#[derive(Debug, Clone, Deserialize)]
pub struct QueuedEvent {
    pub assignment_id: i64,
    pub kind: EventKind,
    #[serde(default)]
    pub break_kind: Option<BreakType>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    pub client_time: DateTime<Utc>,
    pub idempotency_key: String,
}

#[derive(Debug, PartialEq)]
pub enum ReconcileStatus {
    Applied,
    /// The key was already in the ledger; the event was skipped.
    Duplicate,
    Rejected(String),
}

#[derive(Debug)]
pub struct ReconcileReport {
    pub idempotency_key: String,
    pub kind: EventKind,
    pub status: ReconcileStatus,
}

#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub applied: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub reports: Vec<ReconcileReport>,
}

/// Infrastructure failures abort the batch; policy rejections do not.
fn is_policy_error(e: &AppError) -> bool {
    !matches!(
        e,
        AppError::Db(_) | AppError::Io(_) | AppError::Migration(_) | AppError::Other(_)
    )
}

/// Rejected row plus its log entry commit together, same as the
/// service paths.
fn record_rejected(
    conn: &mut rusqlite::Connection,
    ev: &QueuedEvent,
    session_id: Option<i64>,
    reason: &str,
) -> AppResult<()> {
    let tx = conn.transaction()?;
    queries::insert_event(
        &tx,
        &NewGeoEvent {
            assignment_id: ev.assignment_id,
            session_id,
            kind: ev.kind,
            latitude: ev.latitude,
            longitude: ev.longitude,
            accuracy_m: ev.accuracy_m,
            distance_m: None,
            within_geofence: None,
            client_time: ev.client_time,
            idempotency_key: ev.idempotency_key.clone(),
            accepted: false,
            reject_reason: reason.to_string(),
        },
    )?;
    ttlog(
        &tx,
        "reject",
        &format!("assignment:{}", ev.assignment_id),
        &format!("sync {} rejected: {}", ev.kind.to_db_str(), reason),
    )?;
    tx.commit()?;
    Ok(())
}

/// A positioned event missing its coordinates is still ledgered before
/// the rejection is reported.
fn geo_ping(pool: &mut DbPool, ev: &QueuedEvent) -> AppResult<GeoPing> {
    let (Some(lat), Some(lon)) = (ev.latitude, ev.longitude) else {
        record_rejected(&mut pool.conn, ev, None, "invalid_coordinate")?;
        return Err(AppError::InvalidCoordinate(format!(
            "{} event '{}' has no position",
            ev.kind.to_db_str(),
            ev.idempotency_key
        )));
    };
    Ok(GeoPing {
        latitude: lat,
        longitude: lon,
        accuracy_m: ev.accuracy_m,
        client_time: ev.client_time,
        idempotency_key: ev.idempotency_key.clone(),
    })
}

fn apply_one(pool: &mut DbPool, ev: &QueuedEvent) -> AppResult<()> {
    match ev.kind {
        EventKind::CheckIn => {
            // A check-in older than the newest accepted event is a replay
            // of a lifecycle the ledger has already moved past.
            if let Some(latest) = queries::latest_accepted_event_time(&pool.conn, ev.assignment_id)?
                && latest >= ev.client_time
            {
                record_rejected(&mut pool.conn, ev, None, "stale_event")?;
                return Err(AppError::StaleEvent(format!(
                    "check_in at {} precedes the newest accepted event at {latest}",
                    ev.client_time
                )));
            }
            let ping = geo_ping(pool, ev)?;
            service::check_in(pool, ev.assignment_id, &ping)?;
            Ok(())
        }
        EventKind::CheckOut => {
            let ping = geo_ping(pool, ev)?;
            service::check_out(pool, ev.assignment_id, &ping, None)?;
            Ok(())
        }
        EventKind::BreakStart | EventKind::BreakEnd => {
            let Some(session) = queries::find_open_session(&pool.conn, ev.assignment_id)? else {
                record_rejected(&mut pool.conn, ev, None, "no_active_session")?;
                return Err(AppError::NoActiveSession(ev.assignment_id));
            };
            let stamp = EventStamp {
                client_time: ev.client_time,
                idempotency_key: ev.idempotency_key.clone(),
            };
            if ev.kind == EventKind::BreakStart {
                let kind = ev.break_kind.unwrap_or(BreakType::Rest);
                service::break_start(pool, session.id, kind, &stamp, None)?;
            } else {
                service::break_end(pool, session.id, &stamp, None)?;
            }
            Ok(())
        }
    }
}

/// Replay a queued batch against the ledger, client-time ordered.
pub fn reconcile(pool: &mut DbPool, mut events: Vec<QueuedEvent>) -> AppResult<ReconcileOutcome> {
    // Stable sort: ties keep their arrival order.
    events.sort_by_key(|e| e.client_time);

    let mut outcome = ReconcileOutcome::default();

    for ev in &events {
        if queries::event_key_exists(&pool.conn, ev.assignment_id, &ev.idempotency_key)? {
            outcome.duplicates += 1;
            outcome.reports.push(ReconcileReport {
                idempotency_key: ev.idempotency_key.clone(),
                kind: ev.kind,
                status: ReconcileStatus::Duplicate,
            });
            continue;
        }

        let status = match apply_one(pool, ev) {
            Ok(()) => {
                outcome.applied += 1;
                ReconcileStatus::Applied
            }
            Err(AppError::DuplicateEvent(_)) => {
                outcome.duplicates += 1;
                ReconcileStatus::Duplicate
            }
            Err(e) if is_policy_error(&e) => {
                outcome.rejected += 1;
                ReconcileStatus::Rejected(e.to_string())
            }
            Err(e) => return Err(e),
        };

        outcome.reports.push(ReconcileReport {
            idempotency_key: ev.idempotency_key.clone(),
            kind: ev.kind,
            status,
        });
    }

    ttlog(
        &pool.conn,
        "sync",
        "batch",
        &format!(
            "reconciled {} events: {} applied, {} duplicates, {} rejected",
            events.len(),
            outcome.applied,
            outcome.duplicates,
            outcome.rejected
        ),
    )?;

    Ok(outcome)
}
