//! Attendance service: validates commands against the session state
//! machine and persists the result atomically.
//!
//! Every operation runs in a single SQLite transaction; an operation
//! either lands completely (event row + projection update + audit entry)
//! or not at all. Rejected attempts are committed as `accepted = 0` rows
//! so the audit trail also covers what was refused.

use crate::config::Config;
use crate::core::breaks;
use crate::core::certify::{self, CertifyRequest};
use crate::core::geofence::{self, DevicePosition, GeofenceVerdict, SitePosition};
use crate::core::machine::{self, SessionCommand};
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::assignment::Assignment;
use crate::models::break_interval::BreakInterval;
use crate::models::break_type::BreakType;
use crate::models::certification::Certification;
use crate::models::event_kind::EventKind;
use crate::models::geo_event::NewGeoEvent;
use crate::models::session::ShiftSession;
use crate::models::session_state::SessionState;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

/// A device-reported position submission for check-in / check-out.
#[derive(Debug, Clone)]
pub struct GeoPing {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub client_time: DateTime<Utc>,
    /// Client-generated, stable across retries.
    pub idempotency_key: String,
}

/// A break submission; breaks carry no geofence requirement.
#[derive(Debug, Clone)]
pub struct EventStamp {
    pub client_time: DateTime<Utc>,
    pub idempotency_key: String,
}

#[derive(Debug)]
pub struct CheckInOutcome {
    pub session: ShiftSession,
    pub event_id: i64,
    pub verdict: GeofenceVerdict,
}

#[derive(Debug)]
pub struct CheckOutOutcome {
    pub session: ShiftSession,
    pub event_id: i64,
    pub verdict: GeofenceVerdict,
}

#[derive(Debug)]
pub struct BreakOutcome {
    pub session: ShiftSession,
    pub interval: BreakInterval,
}

#[derive(Debug)]
pub struct CertifyResult {
    pub session: ShiftSession,
    pub certification: Certification,
}

fn site_of(assignment: &Assignment) -> SitePosition {
    SitePosition {
        latitude: assignment.site_latitude,
        longitude: assignment.site_longitude,
        radius_m: assignment.geofence_radius_m,
    }
}

fn device_of(ping: &GeoPing) -> DevicePosition {
    DevicePosition {
        latitude: ping.latitude,
        longitude: ping.longitude,
        accuracy_m: ping.accuracy_m,
    }
}

fn check_version(session: &ShiftSession, expected: Option<i64>) -> AppResult<()> {
    if let Some(v) = expected
        && v != session.version
    {
        return Err(AppError::VersionConflict {
            id: session.id,
            expected: v,
            actual: session.version,
        });
    }
    Ok(())
}

/// Append a rejected attempt to the ledger with its reason.
#[allow(clippy::too_many_arguments)]
fn record_rejected(
    conn: &Connection,
    assignment_id: i64,
    session_id: Option<i64>,
    kind: EventKind,
    ping: Option<&GeoPing>,
    verdict: Option<&GeofenceVerdict>,
    client_time: DateTime<Utc>,
    idempotency_key: &str,
    reason: &str,
) -> AppResult<()> {
    queries::insert_event(
        conn,
        &NewGeoEvent {
            assignment_id,
            session_id,
            kind,
            latitude: ping.map(|p| p.latitude),
            longitude: ping.map(|p| p.longitude),
            accuracy_m: ping.and_then(|p| p.accuracy_m),
            distance_m: verdict.map(|v| v.distance_m),
            within_geofence: verdict.map(|v| v.within_geofence),
            client_time,
            idempotency_key: idempotency_key.to_string(),
            accepted: false,
            reject_reason: reason.to_string(),
        },
    )?;
    ttlog(
        conn,
        "reject",
        &format!("assignment:{assignment_id}"),
        &format!("{} rejected: {}", kind.to_db_str(), reason),
    )?;
    Ok(())
}

/// Verified clock-in. Creates the session on a geofence pass; a second
/// check-in while one is open is answered with the existing session's
/// state so device retries stay idempotent.
pub fn check_in(pool: &mut DbPool, assignment_id: i64, ping: &GeoPing) -> AppResult<CheckInOutcome> {
    let tx = pool.conn.transaction()?;

    let assignment = queries::get_assignment(&tx, assignment_id)?;

    if queries::event_key_exists(&tx, assignment_id, &ping.idempotency_key)? {
        return Err(AppError::DuplicateEvent(ping.idempotency_key.clone()));
    }

    let verdict = geofence::evaluate(&device_of(ping), &site_of(&assignment));

    if let Some(existing) = queries::find_open_session(&tx, assignment_id)? {
        record_rejected(
            &tx,
            assignment_id,
            Some(existing.id),
            EventKind::CheckIn,
            Some(ping),
            Some(&verdict),
            ping.client_time,
            &ping.idempotency_key,
            "session_already_active",
        )?;
        tx.commit()?;
        return Err(AppError::SessionAlreadyActive {
            id: existing.id,
            state: existing.state.to_db_str().to_string(),
        });
    }

    if !verdict.within_geofence {
        record_rejected(
            &tx,
            assignment_id,
            None,
            EventKind::CheckIn,
            Some(ping),
            Some(&verdict),
            ping.client_time,
            &ping.idempotency_key,
            "outside_geofence",
        )?;
        tx.commit()?;
        return Err(AppError::OutsideGeofence {
            distance_m: verdict.distance_m,
            radius_m: verdict.radius_m,
        });
    }

    let session_id = queries::insert_session(&tx, &assignment, ping.client_time)?;
    let event_id = queries::insert_event(
        &tx,
        &NewGeoEvent {
            assignment_id,
            session_id: Some(session_id),
            kind: EventKind::CheckIn,
            latitude: Some(ping.latitude),
            longitude: Some(ping.longitude),
            accuracy_m: ping.accuracy_m,
            distance_m: Some(verdict.distance_m),
            within_geofence: Some(true),
            client_time: ping.client_time,
            idempotency_key: ping.idempotency_key.clone(),
            accepted: true,
            reject_reason: String::new(),
        },
    )?;
    ttlog(
        &tx,
        "check_in",
        &format!("session:{session_id}"),
        &format!(
            "worker {} checked in on assignment {} ({:.1} m from site)",
            assignment.worker_id, assignment_id, verdict.distance_m
        ),
    )?;
    tx.commit()?;

    let session = queries::get_session(&pool.conn, session_id)?;
    Ok(CheckInOutcome {
        session,
        event_id,
        verdict,
    })
}

/// Clock-out. Guarded by "no open break"; the geofence verdict is
/// recorded for audit but a worker leaving the site can still clock out
/// (the flag routes to review instead of trapping them on site).
pub fn check_out(
    pool: &mut DbPool,
    assignment_id: i64,
    ping: &GeoPing,
    expected_version: Option<i64>,
) -> AppResult<CheckOutOutcome> {
    let tx = pool.conn.transaction()?;

    let assignment = queries::get_assignment(&tx, assignment_id)?;

    if queries::event_key_exists(&tx, assignment_id, &ping.idempotency_key)? {
        return Err(AppError::DuplicateEvent(ping.idempotency_key.clone()));
    }

    let verdict = geofence::evaluate(&device_of(ping), &site_of(&assignment));

    let Some(session) = queries::find_open_session(&tx, assignment_id)? else {
        record_rejected(
            &tx,
            assignment_id,
            None,
            EventKind::CheckOut,
            Some(ping),
            Some(&verdict),
            ping.client_time,
            &ping.idempotency_key,
            "no_active_session",
        )?;
        tx.commit()?;
        return Err(AppError::NoActiveSession(assignment_id));
    };

    check_version(&session, expected_version)?;

    if ping.client_time < session.clock_in_at {
        record_rejected(
            &tx,
            assignment_id,
            Some(session.id),
            EventKind::CheckOut,
            Some(ping),
            Some(&verdict),
            ping.client_time,
            &ping.idempotency_key,
            "stale_event",
        )?;
        tx.commit()?;
        return Err(AppError::StaleEvent(format!(
            "check_out at {} precedes clock-in at {}",
            ping.client_time, session.clock_in_at
        )));
    }

    let next = match machine::next_state(session.state, SessionCommand::CheckOut) {
        Ok(next) => next,
        Err(e) => {
            let err = if session.state == SessionState::OnBreak {
                AppError::BreakInProgress(session.id)
            } else {
                e
            };
            record_rejected(
                &tx,
                assignment_id,
                Some(session.id),
                EventKind::CheckOut,
                Some(ping),
                Some(&verdict),
                ping.client_time,
                &ping.idempotency_key,
                if session.state == SessionState::OnBreak {
                    "break_in_progress"
                } else {
                    "invalid_transition"
                },
            )?;
            tx.commit()?;
            return Err(err);
        }
    };

    queries::update_session_guarded(&tx, &session, next, Some(ping.client_time))?;
    let event_id = queries::insert_event(
        &tx,
        &NewGeoEvent {
            assignment_id,
            session_id: Some(session.id),
            kind: EventKind::CheckOut,
            latitude: Some(ping.latitude),
            longitude: Some(ping.longitude),
            accuracy_m: ping.accuracy_m,
            distance_m: Some(verdict.distance_m),
            within_geofence: Some(verdict.within_geofence),
            client_time: ping.client_time,
            idempotency_key: ping.idempotency_key.clone(),
            accepted: true,
            reject_reason: String::new(),
        },
    )?;

    if !verdict.within_geofence {
        ttlog(
            &tx,
            "geofence_flag",
            &format!("session:{}", session.id),
            &format!(
                "check_out {:.1} m from site (radius {:.1} m), routed for review",
                verdict.distance_m, verdict.radius_m
            ),
        )?;
    }
    ttlog(
        &tx,
        "check_out",
        &format!("session:{}", session.id),
        &format!("worker {} checked out, pending certification", assignment.worker_id),
    )?;
    tx.commit()?;

    let session = queries::get_session(&pool.conn, session.id)?;
    Ok(CheckOutOutcome {
        session,
        event_id,
        verdict,
    })
}

pub fn break_start(
    pool: &mut DbPool,
    session_id: i64,
    kind: BreakType,
    stamp: &EventStamp,
    expected_version: Option<i64>,
) -> AppResult<BreakOutcome> {
    let tx = pool.conn.transaction()?;

    let session = queries::get_session(&tx, session_id)?;

    if queries::event_key_exists(&tx, session.assignment_id, &stamp.idempotency_key)? {
        return Err(AppError::DuplicateEvent(stamp.idempotency_key.clone()));
    }
    check_version(&session, expected_version)?;

    let intervals = queries::load_breaks(&tx, session_id)?;

    let guard = match session.state {
        SessionState::Active => breaks::validate_start(session_id, &intervals, stamp.client_time),
        SessionState::OnBreak => Err(AppError::BreakAlreadyOpen(session_id)),
        _ => Err(AppError::SessionNotActive(session_id)),
    };
    let guard = guard.and_then(|_| {
        if stamp.client_time < session.clock_in_at {
            Err(AppError::StaleEvent(format!(
                "break_start at {} precedes clock-in at {}",
                stamp.client_time, session.clock_in_at
            )))
        } else {
            Ok(())
        }
    });

    if let Err(e) = guard {
        record_rejected(
            &tx,
            session.assignment_id,
            Some(session_id),
            EventKind::BreakStart,
            None,
            None,
            stamp.client_time,
            &stamp.idempotency_key,
            &reason_code(&e),
        )?;
        tx.commit()?;
        return Err(e);
    }

    let next = machine::next_state(session.state, SessionCommand::BreakStart)?;
    let interval_id = queries::insert_break(&tx, session_id, kind, stamp.client_time)?;
    queries::update_session_guarded(&tx, &session, next, None)?;
    queries::insert_event(
        &tx,
        &NewGeoEvent {
            assignment_id: session.assignment_id,
            session_id: Some(session_id),
            kind: EventKind::BreakStart,
            latitude: None,
            longitude: None,
            accuracy_m: None,
            distance_m: None,
            within_geofence: None,
            client_time: stamp.client_time,
            idempotency_key: stamp.idempotency_key.clone(),
            accepted: true,
            reject_reason: String::new(),
        },
    )?;
    ttlog(
        &tx,
        "break_start",
        &format!("session:{session_id}"),
        &format!("{} break started", kind.to_db_str()),
    )?;
    tx.commit()?;

    let session = queries::get_session(&pool.conn, session_id)?;
    let intervals = queries::load_breaks(&pool.conn, session_id)?;
    let interval = intervals
        .into_iter()
        .find(|b| b.id == interval_id)
        .ok_or_else(|| AppError::Other(format!("break {interval_id} vanished after insert")))?;
    Ok(BreakOutcome { session, interval })
}

pub fn break_end(
    pool: &mut DbPool,
    session_id: i64,
    stamp: &EventStamp,
    expected_version: Option<i64>,
) -> AppResult<BreakOutcome> {
    let tx = pool.conn.transaction()?;

    let session = queries::get_session(&tx, session_id)?;

    if queries::event_key_exists(&tx, session.assignment_id, &stamp.idempotency_key)? {
        return Err(AppError::DuplicateEvent(stamp.idempotency_key.clone()));
    }
    check_version(&session, expected_version)?;

    let intervals = queries::load_breaks(&tx, session_id)?;

    let open = match session.state {
        SessionState::OnBreak => {
            breaks::validate_end(session_id, &intervals, stamp.client_time).map(|b| b.id)
        }
        SessionState::Active => Err(AppError::NoOpenBreak(session_id)),
        _ => Err(AppError::SessionNotActive(session_id)),
    };

    let open_id = match open {
        Ok(id) => id,
        Err(e) => {
            record_rejected(
                &tx,
                session.assignment_id,
                Some(session_id),
                EventKind::BreakEnd,
                None,
                None,
                stamp.client_time,
                &stamp.idempotency_key,
                &reason_code(&e),
            )?;
            tx.commit()?;
            return Err(e);
        }
    };

    let next = machine::next_state(session.state, SessionCommand::BreakEnd)?;
    queries::close_break(&tx, open_id, stamp.client_time)?;
    queries::update_session_guarded(&tx, &session, next, None)?;
    queries::insert_event(
        &tx,
        &NewGeoEvent {
            assignment_id: session.assignment_id,
            session_id: Some(session_id),
            kind: EventKind::BreakEnd,
            latitude: None,
            longitude: None,
            accuracy_m: None,
            distance_m: None,
            within_geofence: None,
            client_time: stamp.client_time,
            idempotency_key: stamp.idempotency_key.clone(),
            accepted: true,
            reject_reason: String::new(),
        },
    )?;
    ttlog(
        &tx,
        "break_end",
        &format!("session:{session_id}"),
        "break ended",
    )?;
    tx.commit()?;

    let session = queries::get_session(&pool.conn, session_id)?;
    let intervals = queries::load_breaks(&pool.conn, session_id)?;
    let interval = intervals
        .into_iter()
        .find(|b| b.id == open_id)
        .ok_or_else(|| AppError::Other(format!("break {open_id} vanished after close")))?;
    Ok(BreakOutcome { session, interval })
}

/// Certification gate: the only path to Closed. The engine recomputes
/// hours from the ledger; a mismatch beyond tolerance closes the session
/// anyway and routes the discrepancy to the review queue.
pub fn certify(
    pool: &mut DbPool,
    cfg: &Config,
    session_id: i64,
    req: &CertifyRequest<'_>,
    expected_version: Option<i64>,
) -> AppResult<CertifyResult> {
    let tx = pool.conn.transaction()?;

    let session = queries::get_session(&tx, session_id)?;
    check_version(&session, expected_version)?;

    if session.state != SessionState::PendingCertification {
        ttlog(
            &tx,
            "certify_rejected",
            &format!("session:{session_id}"),
            &format!("certify in state {}", session.state.to_db_str()),
        )?;
        tx.commit()?;
        return Err(AppError::SessionNotPendingCertification(session_id));
    }

    certify::validate(req)?;

    let intervals = queries::load_breaks(&tx, session_id)?;
    if breaks::open_break(&intervals).is_some() {
        return Err(AppError::BreakInProgress(session_id));
    }

    let clock_out = session
        .clock_out_at
        .ok_or_else(|| AppError::Other(format!("session {session_id} pending without clock-out")))?;

    let outcome = certify::evaluate_hours(
        session.clock_in_at,
        clock_out,
        breaks::closed_minutes(&intervals),
        req.attested_hours,
        cfg.certify_tolerance_minutes,
    );

    let next = machine::next_state(session.state, SessionCommand::Certify)?;

    let closed_count = intervals.iter().filter(|b| !b.is_open()).count() as i64;
    let cert = Certification {
        id: 0,
        session_id,
        attested_hours: req.attested_hours,
        attested_break_count: req.attested_break_count.unwrap_or(closed_count),
        computed_hours: outcome.computed_hours,
        hours_mismatch: outcome.hours_mismatch,
        signer_name: req.signer_name.to_string(),
        signed_at: Utc::now(),
    };
    let cert_id = queries::insert_certification(&tx, &cert)?;
    queries::update_session_guarded(&tx, &session, next, None)?;

    ttlog(
        &tx,
        "certify",
        &format!("session:{session_id}"),
        &format!(
            "closed by {}: attested {:.2} h, computed {:.2} h",
            req.signer_name, req.attested_hours, outcome.computed_hours
        ),
    )?;
    if outcome.hours_mismatch {
        ttlog(
            &tx,
            "hours_mismatch",
            &format!("session:{session_id}"),
            &format!(
                "attested {:.2} h vs computed {:.2} h, routed for review",
                req.attested_hours, outcome.computed_hours
            ),
        )?;
    }
    tx.commit()?;

    let session = queries::get_session(&pool.conn, session_id)?;
    let certification = queries::get_certification(&pool.conn, session_id)?
        .ok_or_else(|| AppError::Other(format!("certification {cert_id} vanished after insert")))?;
    Ok(CertifyResult {
        session,
        certification,
    })
}

fn reason_code(e: &AppError) -> String {
    match e {
        AppError::BreakAlreadyOpen(_) => "break_already_open".to_string(),
        AppError::NoOpenBreak(_) => "no_open_break".to_string(),
        AppError::BreakInProgress(_) => "break_in_progress".to_string(),
        AppError::SessionNotActive(_) => "session_not_active".to_string(),
        AppError::StaleEvent(_) => "stale_event".to_string(),
        AppError::OutsideGeofence { .. } => "outside_geofence".to_string(),
        AppError::InvalidTransition { .. } => "invalid_transition".to_string(),
        other => format!("{other}"),
    }
}
