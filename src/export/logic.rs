// src/export/logic.rs

use crate::core::payable;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::PayrollExport;
use crate::models::session_state::SessionState;
use crate::ui::messages::warning;
use chrono::Utc;
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// High-level export entry point.
pub struct ExportLogic;

impl ExportLogic {
    /// Export payroll rows.
    ///
    /// - `format`: csv | json
    /// - `file`: absolute output path
    /// - `all`: include open and pending sessions, not just closed ones
    pub fn export(
        pool: &mut DbPool,
        format: ExportFormat,
        file: &str,
        all: bool,
        force: bool,
    ) -> AppResult<()> {
        let path = Path::new(file);

        if !path.is_absolute() {
            return Err(AppError::from(io::Error::other(format!(
                "Output file path must be absolute: {file}"
            ))));
        }

        ensure_writable(path, force)?;

        let rows = load_rows(pool, all)?;

        if rows.is_empty() {
            warning("No sessions found to export.");
            return Ok(());
        }

        match format {
            ExportFormat::Csv => export_csv(&rows, path)?,
            ExportFormat::Json => export_json(&rows, path)?,
        }

        Ok(())
    }
}

fn load_rows(pool: &mut DbPool, all: bool) -> AppResult<Vec<PayrollExport>> {
    let conn = &pool.conn;

    let state = if all { None } else { Some(SessionState::Closed) };
    let sessions = queries::list_sessions(conn, None, None, state)?;

    let mut site_names: HashMap<i64, String> = HashMap::new();
    let now = Utc::now();

    let mut rows = Vec::with_capacity(sessions.len());
    for session in &sessions {
        let site_name = match site_names.get(&session.assignment_id) {
            Some(name) => name.clone(),
            None => {
                let a = queries::get_assignment(conn, session.assignment_id)?;
                site_names.insert(a.id, a.site_name.clone());
                a.site_name
            }
        };

        let intervals = queries::load_breaks(conn, session.id)?;
        let summary = payable::summarize(session, &intervals, now);
        let cert = queries::get_certification(conn, session.id)?;

        rows.push(PayrollExport {
            session_id: session.id,
            assignment_id: session.assignment_id,
            worker_id: session.worker_id.clone(),
            site_name,
            state: session.state.to_db_str().to_string(),
            clock_in: session.clock_in_at.to_rfc3339(),
            clock_out: session
                .clock_out_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            break_minutes: summary.break_minutes,
            payable_minutes: summary.payable_minutes,
            payable_hours: summary.payable_hours(),
            certified: cert.is_some(),
            signer_name: cert.as_ref().map(|c| c.signer_name.clone()).unwrap_or_default(),
            attested_hours: cert.as_ref().map(|c| c.attested_hours),
            hours_mismatch: cert.map(|c| c.hours_mismatch).unwrap_or(false),
        });
    }

    Ok(rows)
}
