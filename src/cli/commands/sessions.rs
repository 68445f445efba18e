use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::payable;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::session_state::SessionState;
use crate::ui::messages::info;
use crate::utils::fmt::fmt_minutes;
use chrono::Utc;

/// List sessions with their recomputed payable time.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Sessions {
        assignment,
        worker,
        state,
    } = cmd
    {
        let state_filter = state
            .as_deref()
            .map(|s| SessionState::from_db_str(s).ok_or_else(|| AppError::InvalidState(s.to_string())))
            .transpose()?;

        let pool = DbPool::new(&cfg.database)?;
        let sessions =
            queries::list_sessions(&pool.conn, *assignment, worker.as_deref(), state_filter)?;

        if sessions.is_empty() {
            info("No sessions match.");
            return Ok(());
        }

        let now = Utc::now();
        println!(
            "{:>4}  {:>6}  {:<12} {:<22} {:<10} {:>9} {:>9}  {:>3}",
            "id", "assign", "worker", "state", "clock-in", "breaks", "payable", "ver"
        );
        for s in &sessions {
            let intervals = queries::load_breaks(&pool.conn, s.id)?;
            let summary = payable::summarize(s, &intervals, now);
            println!(
                "{:>4}  {:>6}  {:<12} {:<22} {:<10} {:>9} {:>9}  {:>3}",
                s.id,
                s.assignment_id,
                s.worker_id,
                s.state.to_db_str(),
                s.clock_in_at.format("%H:%M %d/%m"),
                fmt_minutes(summary.break_minutes),
                fmt_minutes(summary.payable_minutes),
                s.version,
            );
        }
    }

    Ok(())
}
