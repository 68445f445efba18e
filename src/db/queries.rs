//! Typed row access for the attendance ledger.
//!
//! `geo_events`, `breaks` and `certifications` are append-only: nothing in
//! this module updates or deletes a persisted event. The only mutable rows
//! are the `sessions` projection (guarded by its version counter) and the
//! `ended_at` of an open break interval.

use crate::errors::{AppError, AppResult};
use crate::models::assignment::Assignment;
use crate::models::break_interval::BreakInterval;
use crate::models::break_type::BreakType;
use crate::models::certification::Certification;
use crate::models::event_kind::EventKind;
use crate::models::geo_event::{GeoEvent, NewGeoEvent};
use crate::models::session::ShiftSession;
use crate::models::session_state::SessionState;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(AppError::InvalidTimestamp(s.to_string())),
            )
        })
}

fn parse_ts_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    match s {
        Some(v) => Ok(Some(parse_ts(&v)?)),
        None => Ok(None),
    }
}

fn ts_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------
// Assignments
// ---------------------------

pub struct NewAssignment<'a> {
    pub worker_id: &'a str,
    pub site_name: &'a str,
    pub site_latitude: f64,
    pub site_longitude: f64,
    pub geofence_radius_m: f64,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
}

pub fn map_assignment_row(row: &Row) -> Result<Assignment> {
    let created: String = row.get("created_at")?;
    Ok(Assignment {
        id: row.get("id")?,
        worker_id: row.get("worker_id")?,
        site_name: row.get("site_name")?,
        site_latitude: row.get("site_latitude")?,
        site_longitude: row.get("site_longitude")?,
        geofence_radius_m: row.get("geofence_radius_m")?,
        scheduled_start: parse_ts_opt(row.get("scheduled_start")?)?,
        scheduled_end: parse_ts_opt(row.get("scheduled_end")?)?,
        created_at: parse_ts(&created)?,
    })
}

pub fn insert_assignment(conn: &Connection, a: &NewAssignment) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO assignments
            (worker_id, site_name, site_latitude, site_longitude,
             geofence_radius_m, scheduled_start, scheduled_end, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            a.worker_id,
            a.site_name,
            a.site_latitude,
            a.site_longitude,
            a.geofence_radius_m,
            a.scheduled_start.map(ts_str),
            a.scheduled_end.map(ts_str),
            ts_str(Utc::now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_assignment(conn: &Connection, id: i64) -> AppResult<Assignment> {
    let mut stmt = conn.prepare_cached("SELECT * FROM assignments WHERE id = ?1")?;
    stmt.query_row([id], map_assignment_row)
        .optional()?
        .ok_or(AppError::AssignmentNotFound(id))
}

pub fn list_assignments(conn: &Connection) -> AppResult<Vec<Assignment>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM assignments ORDER BY id ASC")?;
    let rows = stmt.query_map([], map_assignment_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

// ---------------------------
// Sessions
// ---------------------------

pub fn map_session_row(row: &Row) -> Result<ShiftSession> {
    let state_str: String = row.get("state")?;
    let state = SessionState::from_db_str(&state_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidState(state_str.clone())),
        )
    })?;

    let clock_in: String = row.get("clock_in_at")?;
    let created: String = row.get("created_at")?;

    Ok(ShiftSession {
        id: row.get("id")?,
        assignment_id: row.get("assignment_id")?,
        worker_id: row.get("worker_id")?,
        state,
        clock_in_at: parse_ts(&clock_in)?,
        clock_out_at: parse_ts_opt(row.get("clock_out_at")?)?,
        version: row.get("version")?,
        created_at: parse_ts(&created)?,
    })
}

pub fn insert_session(
    conn: &Connection,
    assignment: &Assignment,
    clock_in_at: DateTime<Utc>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO sessions
            (assignment_id, worker_id, state, clock_in_at, version, created_at)
         VALUES (?1, ?2, 'active', ?3, 1, ?4)",
        params![
            assignment.id,
            assignment.worker_id,
            ts_str(clock_in_at),
            ts_str(Utc::now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_session(conn: &Connection, id: i64) -> AppResult<ShiftSession> {
    let mut stmt = conn.prepare_cached("SELECT * FROM sessions WHERE id = ?1")?;
    stmt.query_row([id], map_session_row)
        .optional()?
        .ok_or(AppError::SessionNotFound(id))
}

/// The open (non-closed, non-cancelled) session of an assignment, if any.
/// The partial unique index guarantees there is at most one.
pub fn find_open_session(conn: &Connection, assignment_id: i64) -> AppResult<Option<ShiftSession>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM sessions
         WHERE assignment_id = ?1 AND state NOT IN ('closed','cancelled')
         LIMIT 1",
    )?;
    Ok(stmt.query_row([assignment_id], map_session_row).optional()?)
}

/// Apply a state change to the projection, guarded by the version counter.
/// A stale guard means a concurrent writer won; the caller retries against
/// the current row.
pub fn update_session_guarded(
    conn: &Connection,
    session: &ShiftSession,
    new_state: SessionState,
    clock_out_at: Option<DateTime<Utc>>,
) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE sessions
         SET state = ?1, clock_out_at = ?2, version = version + 1
         WHERE id = ?3 AND version = ?4",
        params![
            new_state.to_db_str(),
            clock_out_at.or(session.clock_out_at).map(ts_str),
            session.id,
            session.version,
        ],
    )?;

    if changed == 0 {
        let current = get_session(conn, session.id)?;
        return Err(AppError::VersionConflict {
            id: session.id,
            expected: session.version,
            actual: current.version,
        });
    }
    Ok(())
}

pub fn list_sessions(
    conn: &Connection,
    assignment_id: Option<i64>,
    worker_id: Option<&str>,
    state: Option<SessionState>,
) -> AppResult<Vec<ShiftSession>> {
    let mut sql = "SELECT * FROM sessions".to_string();
    let mut conditions: Vec<String> = Vec::new();
    let mut owned: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(a) = assignment_id {
        conditions.push(format!("assignment_id = ?{}", owned.len() + 1));
        owned.push(Box::new(a));
    }
    if let Some(w) = worker_id {
        conditions.push(format!("worker_id = ?{}", owned.len() + 1));
        owned.push(Box::new(w.to_string()));
    }
    if let Some(s) = state {
        conditions.push(format!("state = ?{}", owned.len() + 1));
        owned.push(Box::new(s.to_db_str().to_string()));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY id ASC");

    let mut stmt = conn.prepare_cached(&sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = owned.iter().map(|b| b.as_ref()).collect();
    let rows = stmt.query_map(param_refs.as_slice(), map_session_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

// ---------------------------
// Geo events
// ---------------------------

pub fn map_event_row(row: &Row) -> Result<GeoEvent> {
    let kind_str: String = row.get("kind")?;
    let kind = EventKind::from_db_str(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidEventKind(kind_str.clone())),
        )
    })?;

    let client: String = row.get("client_time")?;
    let server: String = row.get("server_time")?;

    Ok(GeoEvent {
        id: row.get("id")?,
        assignment_id: row.get("assignment_id")?,
        session_id: row.get("session_id")?,
        kind,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        accuracy_m: row.get("accuracy_m")?,
        distance_m: row.get("distance_m")?,
        within_geofence: row
            .get::<_, Option<i64>>("within_geofence")?
            .map(|v| v == 1),
        client_time: parse_ts(&client)?,
        server_time: parse_ts(&server)?,
        idempotency_key: row.get("idempotency_key")?,
        accepted: row.get::<_, i64>("accepted")? == 1,
        reject_reason: row.get("reject_reason")?,
    })
}

pub fn event_key_exists(conn: &Connection, assignment_id: i64, key: &str) -> AppResult<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM geo_events WHERE assignment_id = ?1 AND idempotency_key = ?2 LIMIT 1",
    )?;
    Ok(stmt.exists(params![assignment_id, key])?)
}

pub fn insert_event(conn: &Connection, ev: &NewGeoEvent) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO geo_events
            (assignment_id, session_id, kind, latitude, longitude, accuracy_m,
             distance_m, within_geofence, client_time, server_time,
             idempotency_key, accepted, reject_reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            ev.assignment_id,
            ev.session_id,
            ev.kind.to_db_str(),
            ev.latitude,
            ev.longitude,
            ev.accuracy_m,
            ev.distance_m,
            ev.within_geofence.map(|v| if v { 1 } else { 0 }),
            ts_str(ev.client_time),
            ts_str(Utc::now()),
            ev.idempotency_key,
            if ev.accepted { 1 } else { 0 },
            ev.reject_reason,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Ordered event history for an assignment, rejected attempts included.
pub fn list_events_by_assignment(conn: &Connection, assignment_id: i64) -> AppResult<Vec<GeoEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM geo_events
         WHERE assignment_id = ?1
         ORDER BY client_time ASC, id ASC",
    )?;
    let rows = stmt.query_map([assignment_id], map_event_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Client time of the newest accepted event for an assignment. Used by the
/// reconciler to spot replays of a lifecycle the ledger already moved past.
pub fn latest_accepted_event_time(
    conn: &Connection,
    assignment_id: i64,
) -> AppResult<Option<DateTime<Utc>>> {
    let mut stmt = conn.prepare_cached(
        "SELECT MAX(client_time) FROM geo_events
         WHERE assignment_id = ?1 AND accepted = 1",
    )?;
    let raw: Option<String> = stmt.query_row([assignment_id], |r| r.get(0))?;
    Ok(parse_ts_opt(raw)?)
}

// ---------------------------
// Breaks
// ---------------------------

pub fn map_break_row(row: &Row) -> Result<BreakInterval> {
    let kind_str: String = row.get("kind")?;
    let kind = BreakType::from_db_str(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidBreakType(kind_str.clone())),
        )
    })?;

    let started: String = row.get("started_at")?;
    Ok(BreakInterval {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        kind,
        started_at: parse_ts(&started)?,
        ended_at: parse_ts_opt(row.get("ended_at")?)?,
    })
}

pub fn load_breaks(conn: &Connection, session_id: i64) -> AppResult<Vec<BreakInterval>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM breaks WHERE session_id = ?1 ORDER BY started_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([session_id], map_break_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn insert_break(
    conn: &Connection,
    session_id: i64,
    kind: BreakType,
    started_at: DateTime<Utc>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO breaks (session_id, kind, started_at) VALUES (?1, ?2, ?3)",
        params![session_id, kind.to_db_str(), ts_str(started_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn close_break(conn: &Connection, break_id: i64, ended_at: DateTime<Utc>) -> AppResult<()> {
    conn.execute(
        "UPDATE breaks SET ended_at = ?1 WHERE id = ?2 AND ended_at IS NULL",
        params![ts_str(ended_at), break_id],
    )?;
    Ok(())
}

// ---------------------------
// Certifications
// ---------------------------

pub fn map_certification_row(row: &Row) -> Result<Certification> {
    let signed: String = row.get("signed_at")?;
    Ok(Certification {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        attested_hours: row.get("attested_hours")?,
        attested_break_count: row.get("attested_break_count")?,
        computed_hours: row.get("computed_hours")?,
        hours_mismatch: row.get::<_, i64>("hours_mismatch")? == 1,
        signer_name: row.get("signer_name")?,
        signed_at: parse_ts(&signed)?,
    })
}

pub fn insert_certification(conn: &Connection, cert: &Certification) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO certifications
            (session_id, attested_hours, attested_break_count, computed_hours,
             hours_mismatch, signer_name, signed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            cert.session_id,
            cert.attested_hours,
            cert.attested_break_count,
            cert.computed_hours,
            if cert.hours_mismatch { 1 } else { 0 },
            cert.signer_name,
            ts_str(cert.signed_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_certification(conn: &Connection, session_id: i64) -> AppResult<Option<Certification>> {
    let mut stmt =
        conn.prepare_cached("SELECT * FROM certifications WHERE session_id = ?1")?;
    Ok(stmt
        .query_row([session_id], map_certification_row)
        .optional()?)
}

// ---------------------------
// Introspection (db --info)
// ---------------------------

pub fn table_counts(conn: &Connection) -> AppResult<Vec<(String, i64)>> {
    let tables = [
        "assignments",
        "sessions",
        "geo_events",
        "breaks",
        "certifications",
        "log",
    ];

    let mut out = Vec::new();
    for t in tables {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {t}"), [], |r| r.get(0))?;
        out.push((t.to_string(), n));
    }
    Ok(out)
}
