//! Schema creation and upgrades.
//!
//! The ledger tables are append-only, so migrations are additive only:
//! new columns or indexes, never rewrites of persisted events. Applied
//! migrations are marked in the `log` table.

use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let exists: Option<String> = stmt.query_row([name], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{table}')"))?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Create the attendance ledger tables with the modern schema.
fn create_core_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS assignments (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            worker_id         TEXT NOT NULL,
            site_name         TEXT NOT NULL DEFAULT '',
            site_latitude     REAL NOT NULL,
            site_longitude    REAL NOT NULL,
            geofence_radius_m REAL NOT NULL,
            scheduled_start   TEXT,
            scheduled_end     TEXT,
            created_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            assignment_id INTEGER NOT NULL REFERENCES assignments(id),
            worker_id     TEXT NOT NULL,
            state         TEXT NOT NULL CHECK(state IN
                ('active','on_break','pending_certification','closed','cancelled')),
            clock_in_at   TEXT NOT NULL,
            clock_out_at  TEXT,
            version       INTEGER NOT NULL DEFAULT 1,
            created_at    TEXT NOT NULL
        );

        -- At most one non-closed, non-cancelled session per (worker, assignment).
        CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_open
            ON sessions(worker_id, assignment_id)
            WHERE state NOT IN ('closed','cancelled');

        CREATE TABLE IF NOT EXISTS geo_events (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            assignment_id   INTEGER NOT NULL REFERENCES assignments(id),
            session_id      INTEGER REFERENCES sessions(id),
            kind            TEXT NOT NULL CHECK(kind IN
                ('check_in','check_out','break_start','break_end')),
            latitude        REAL,
            longitude       REAL,
            accuracy_m      REAL,
            distance_m      REAL,
            within_geofence INTEGER,
            client_time     TEXT NOT NULL,
            server_time     TEXT NOT NULL,
            idempotency_key TEXT NOT NULL,
            accepted        INTEGER NOT NULL,
            reject_reason   TEXT NOT NULL DEFAULT ''
        );

        -- Exactly-once application of retried device submissions.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_events_idem
            ON geo_events(assignment_id, idempotency_key);
        CREATE INDEX IF NOT EXISTS idx_events_session ON geo_events(session_id);
        CREATE INDEX IF NOT EXISTS idx_events_assignment_time
            ON geo_events(assignment_id, client_time);

        CREATE TABLE IF NOT EXISTS breaks (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES sessions(id),
            kind       TEXT NOT NULL CHECK(kind IN ('meal','rest')),
            started_at TEXT NOT NULL,
            ended_at   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_breaks_session ON breaks(session_id);

        CREATE TABLE IF NOT EXISTS certifications (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id           INTEGER NOT NULL UNIQUE REFERENCES sessions(id),
            attested_hours       REAL NOT NULL,
            attested_break_count INTEGER NOT NULL,
            computed_hours       REAL NOT NULL,
            hours_mismatch       INTEGER NOT NULL,
            signer_name          TEXT NOT NULL,
            signed_at            TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// 0.3.x databases predate the rejected-attempt audit columns.
fn migrate_add_reject_audit_columns(conn: &Connection) -> Result<()> {
    let version = "20250413_0007_add_reject_audit";

    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    if chk.query_row([version], |_| Ok(())).optional()?.is_some() {
        return Ok(());
    }

    if !table_has_column(conn, "geo_events", "reject_reason")? {
        conn.execute_batch(
            r#"
            ALTER TABLE geo_events ADD COLUMN accepted INTEGER NOT NULL DEFAULT 1;
            ALTER TABLE geo_events ADD COLUMN reject_reason TEXT NOT NULL DEFAULT '';
            "#,
        )?;
        success(format!(
            "Migration applied: {version} → added reject audit columns to geo_events"
        ));
    }

    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, 'Added reject audit columns to geo_events')",
        [version],
    )?;

    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;

    let fresh = !table_exists(conn, "geo_events")?;
    create_core_tables(conn)?;

    if fresh {
        // Mark column migrations as applied so they are skipped later.
        conn.execute(
            "INSERT INTO log (date, operation, target, message)
             VALUES (datetime('now'), 'migration_applied',
                     '20250413_0007_add_reject_audit', 'Fresh schema, nothing to do')",
            [],
        )?;
        return Ok(());
    }

    migrate_add_reject_audit_columns(conn)?;
    Ok(())
}
