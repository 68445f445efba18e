use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::geofence::{self, DevicePosition, SitePosition};
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use crate::utils::fmt::fmt_distance;

/// Dry-run geofence check: reports the verdict, writes nothing.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Locate {
        assignment,
        lat,
        lon,
        accuracy,
    } = cmd
    {
        let pool = DbPool::new(&cfg.database)?;
        let a = queries::get_assignment(&pool.conn, *assignment)?;

        let verdict = geofence::evaluate(
            &DevicePosition {
                latitude: *lat,
                longitude: *lon,
                accuracy_m: *accuracy,
            },
            &SitePosition {
                latitude: a.site_latitude,
                longitude: a.site_longitude,
                radius_m: a.geofence_radius_m,
            },
        );

        info(format!(
            "Site '{}': {} from center, geofence {}",
            a.site_name,
            fmt_distance(verdict.distance_m, &cfg.display_unit),
            fmt_distance(verdict.radius_m, &cfg.display_unit),
        ));
        if let Some(acc) = verdict.accuracy_m {
            info(format!("Reported GPS accuracy: {acc:.1} m"));
        }

        if verdict.within_geofence {
            success("Within geofence: check-in would be accepted.");
        } else {
            warning("Outside geofence: check-in would be rejected.");
        }
    }

    Ok(())
}
