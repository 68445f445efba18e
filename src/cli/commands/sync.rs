use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::reconcile::{self, QueuedEvent, ReconcileStatus};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use std::fs;

/// Reconcile a queued batch of offline events from a JSON file.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Sync { file } = cmd {
        let raw = fs::read_to_string(file)?;
        let events: Vec<QueuedEvent> = serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("Invalid sync batch '{file}': {e}")))?;

        if events.is_empty() {
            info("Sync batch is empty, nothing to do.");
            return Ok(());
        }

        let total = events.len();
        let mut pool = DbPool::new(&cfg.database)?;
        let outcome = reconcile::reconcile(&mut pool, events)?;

        success(format!(
            "Sync completed: {} of {} applied, {} duplicates, {} rejected",
            outcome.applied, total, outcome.duplicates, outcome.rejected
        ));

        for report in &outcome.reports {
            if let ReconcileStatus::Rejected(reason) = &report.status {
                warning(format!(
                    "Rejected {} '{}': {}",
                    report.kind.to_db_str(),
                    report.idempotency_key,
                    reason
                ));
            }
        }
    }

    Ok(())
}
