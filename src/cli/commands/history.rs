use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppResult;
use crate::ui::messages::{header, info};
use crate::utils::fmt::fmt_distance;

/// Print the full event trail of an assignment, rejected attempts included.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::History { assignment } = cmd {
        let pool = DbPool::new(&cfg.database)?;
        let a = queries::get_assignment(&pool.conn, *assignment)?;
        let events = queries::list_events_by_assignment(&pool.conn, *assignment)?;

        header(format!(
            "Events for assignment {} (worker {}, site '{}')",
            a.id, a.worker_id, a.site_name
        ));

        if events.is_empty() {
            info("No events recorded.");
            return Ok(());
        }

        for e in &events {
            let mark = if e.accepted { "✓" } else { "✗" };
            let session = e
                .session_id
                .map(|id| format!("session {id}"))
                .unwrap_or_else(|| "-".to_string());
            let distance = e
                .distance_m
                .map(|d| fmt_distance(d, &cfg.display_unit))
                .unwrap_or_else(|| "-".to_string());
            let note = if e.accepted {
                String::new()
            } else {
                format!("  [{}]", e.reject_reason)
            };

            println!(
                "{:>5}  {}  {:<12} {}  {:<12} {:>10}{}",
                e.id,
                e.client_time.to_rfc3339(),
                e.kind.to_db_str(),
                mark,
                session,
                distance,
                note,
            );
        }
    }

    Ok(())
}
