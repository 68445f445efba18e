use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::service::{self, EventStamp};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::break_type::BreakType;
use crate::ui::messages::success;
use crate::utils::fmt::fmt_minutes;
use crate::utils::time::{gen_idempotency_key, parse_optional_timestamp};

/// Start or end a break on an active session.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Break {
        session,
        start,
        end,
        at,
        key,
        expect_version,
    } = cmd
    {
        let stamp = EventStamp {
            client_time: parse_optional_timestamp(at.as_ref())?,
            idempotency_key: key
                .clone()
                .unwrap_or_else(|| gen_idempotency_key("break")),
        };

        let mut pool = DbPool::new(&cfg.database)?;

        match (start.as_deref(), *end) {
            (Some(code), false) => {
                let kind = BreakType::from_code(code)
                    .ok_or_else(|| AppError::InvalidBreakType(code.to_string()))?;
                let outcome =
                    service::break_start(&mut pool, *session, kind, &stamp, *expect_version)?;
                success(format!(
                    "{} break started on session {} (version {})",
                    kind.to_db_str(),
                    outcome.session.id,
                    outcome.session.version,
                ));
            }
            (None, true) => {
                let outcome = service::break_end(&mut pool, *session, &stamp, *expect_version)?;
                success(format!(
                    "Break ended on session {}: {} deducted",
                    outcome.session.id,
                    fmt_minutes(outcome.interval.closed_minutes()),
                ));
            }
            _ => {
                return Err(AppError::Config(
                    "Use either --start <TYPE> or --end".to_string(),
                ));
            }
        }
    }

    Ok(())
}
