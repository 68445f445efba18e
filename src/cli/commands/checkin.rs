use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::service::{self, GeoPing};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{success, warning};
use crate::utils::fmt::fmt_distance;
use crate::utils::time::{gen_idempotency_key, parse_optional_timestamp};

/// Verified clock-in.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Checkin {
        assignment,
        lat,
        lon,
        accuracy,
        at,
        key,
    } = cmd
    {
        let ping = GeoPing {
            latitude: *lat,
            longitude: *lon,
            accuracy_m: *accuracy,
            client_time: parse_optional_timestamp(at.as_ref())?,
            idempotency_key: key
                .clone()
                .unwrap_or_else(|| gen_idempotency_key("checkin")),
        };

        let mut pool = DbPool::new(&cfg.database)?;

        match service::check_in(&mut pool, *assignment, &ping) {
            Ok(outcome) => {
                success(format!(
                    "Checked in: session {} (version {}), {} from site",
                    outcome.session.id,
                    outcome.session.version,
                    fmt_distance(outcome.verdict.distance_m, &cfg.display_unit),
                ));
            }
            // A repeat check-in reports the existing session instead of
            // failing: device retries are expected.
            Err(AppError::SessionAlreadyActive { id, state }) => {
                warning(format!(
                    "Already checked in: session {id} is {state}. No new session created."
                ));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
