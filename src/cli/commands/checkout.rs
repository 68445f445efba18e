use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::payable;
use crate::core::service::{self, GeoPing};
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppResult;
use crate::ui::messages::{review, success};
use crate::utils::fmt::{fmt_distance, fmt_minutes};
use crate::utils::time::{gen_idempotency_key, parse_optional_timestamp};

/// Clock-out; the session awaits certification.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Checkout {
        assignment,
        lat,
        lon,
        accuracy,
        at,
        key,
        expect_version,
    } = cmd
    {
        let ping = GeoPing {
            latitude: *lat,
            longitude: *lon,
            accuracy_m: *accuracy,
            client_time: parse_optional_timestamp(at.as_ref())?,
            idempotency_key: key
                .clone()
                .unwrap_or_else(|| gen_idempotency_key("checkout")),
        };

        let mut pool = DbPool::new(&cfg.database)?;
        let outcome = service::check_out(&mut pool, *assignment, &ping, *expect_version)?;

        let intervals = queries::load_breaks(&pool.conn, outcome.session.id)?;
        let summary = payable::summarize(&outcome.session, &intervals, ping.client_time);

        success(format!(
            "Checked out: session {} pending certification, {} worked ({} breaks deducted)",
            outcome.session.id,
            fmt_minutes(summary.payable_minutes),
            fmt_minutes(summary.break_minutes),
        ));

        if !outcome.verdict.within_geofence {
            review(format!(
                "Check-out was {} from site (geofence {}); flagged for review.",
                fmt_distance(outcome.verdict.distance_m, &cfg.display_unit),
                fmt_distance(outcome.verdict.radius_m, &cfg.display_unit),
            ));
        }
    }

    Ok(())
}
