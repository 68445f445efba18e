use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::geofence::feet_to_meters;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries::{self, NewAssignment};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use crate::utils::time::parse_timestamp;

fn validate_coords(lat: f64, lon: f64) -> AppResult<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::InvalidCoordinate(format!("latitude {lat}")));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::InvalidCoordinate(format!("longitude {lon}")));
    }
    Ok(())
}

/// Create a work assignment with its geofenced site.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Assign {
        worker,
        site,
        lat,
        lon,
        radius_ft,
        start,
        end,
    } = cmd
    {
        validate_coords(*lat, *lon)?;

        let radius_m = match radius_ft {
            Some(ft) if *ft > 0.0 => feet_to_meters(*ft),
            Some(ft) => {
                return Err(AppError::Config(format!(
                    "Geofence radius must be positive, got {ft} ft"
                )));
            }
            None => cfg.default_radius_m(),
        };

        let scheduled_start = start.as_deref().map(parse_timestamp).transpose()?;
        let scheduled_end = end.as_deref().map(parse_timestamp).transpose()?;

        let mut pool = DbPool::new(&cfg.database)?;

        let id = queries::insert_assignment(
            &pool.conn,
            &NewAssignment {
                worker_id: worker,
                site_name: site,
                site_latitude: *lat,
                site_longitude: *lon,
                geofence_radius_m: radius_m,
                scheduled_start,
                scheduled_end,
            },
        )?;

        ttlog(
            &pool.conn,
            "assign",
            &format!("assignment:{id}"),
            &format!("worker {worker} assigned to site '{site}' (radius {radius_m:.1} m)"),
        )?;

        success(format!(
            "Assignment {id} created: worker {worker} at '{site}' ({lat}, {lon}), geofence {radius_m:.1} m"
        ));
    }

    Ok(())
}
