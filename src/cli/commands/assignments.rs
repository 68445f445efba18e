use crate::config::Config;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::utils::fmt::fmt_distance;

/// List all assignments with their geofenced sites.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let pool = DbPool::new(&cfg.database)?;
    let assignments = queries::list_assignments(&pool.conn)?;

    if assignments.is_empty() {
        info("No assignments yet. Create one with `assign`.");
        return Ok(());
    }

    println!(
        "{:>4}  {:<12} {:<20} {:>11} {:>12}  {:<10}",
        "id", "worker", "site", "lat", "lon", "radius"
    );
    for a in &assignments {
        println!(
            "{:>4}  {:<12} {:<20} {:>11.6} {:>12.6}  {:<10}",
            a.id,
            a.worker_id,
            a.site_name,
            a.site_latitude,
            a.site_longitude,
            fmt_distance(a.geofence_radius_m, &cfg.display_unit),
        );
    }

    Ok(())
}
