use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::migrate::run_pending_migrations;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppResult;
use crate::ui::messages::{error, info, success};
use std::fs;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Db {
        migrate,
        check,
        vacuum,
        info: show_info,
    } = cmd
    {
        // Single shared instance
        let mut pool: Option<DbPool> = None;

        fn get_pool<'a>(pool: &'a mut Option<DbPool>, db_path: &str) -> AppResult<&'a mut DbPool> {
            if pool.is_none() {
                *pool = Some(DbPool::new(db_path)?);
            }
            Ok(pool.as_mut().expect("pool initialized above"))
        }

        if *migrate {
            let pool = get_pool(&mut pool, &cfg.database)?;
            info("Running migrations…");
            run_pending_migrations(&pool.conn)?;
            success("Migration completed.");
        }

        if *show_info {
            let pool = get_pool(&mut pool, &cfg.database)?;

            let file_size = fs::metadata(&cfg.database).map(|m| m.len()).unwrap_or(0);
            let file_mb = (file_size as f64) / (1024.0 * 1024.0);

            println!("• File: {}", cfg.database);
            println!("• Size: {file_mb:.2} MB");
            for (table, count) in queries::table_counts(&pool.conn)? {
                println!("• {table}: {count} rows");
            }
        }

        if *check {
            let pool = get_pool(&mut pool, &cfg.database)?;

            info("Running integrity check…");

            let integrity: String = pool
                .conn
                .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;

            if integrity == "ok" {
                success("Integrity check passed.");
            } else {
                error(format!("Integrity check failed: {integrity}"));
            }
        }

        if *vacuum {
            let pool = get_pool(&mut pool, &cfg.database)?;
            info("Running VACUUM…");

            pool.conn.execute_batch("VACUUM;")?;

            success("Vacuum completed.");
        }
    }

    Ok(())
}
