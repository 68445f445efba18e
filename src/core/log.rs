use crate::config::Config;
use crate::db::log::load_log;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;

/// Color by operation kind.
fn color_for_operation(op: &str) -> Colour {
    match op {
        "check_in" => Colour::Green,
        "check_out" => Colour::Blue,
        "break_start" | "break_end" => Colour::Cyan,
        "certify" => Colour::Green,
        "reject" | "certify_rejected" => Colour::Red,
        "hours_mismatch" | "geofence_flag" => Colour::Yellow,
        "migration_applied" => Colour::Purple,
        "sync" => Colour::Purple,
        "backup" => Colour::Blue,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

pub struct LogLogic;

impl LogLogic {
    pub fn print_log(pool: &mut DbPool, _cfg: &Config) -> AppResult<()> {
        let entries = load_log(&pool.conn)?;

        if entries.is_empty() {
            println!("Log is empty.");
            return Ok(());
        }

        let op_width = entries
            .iter()
            .map(|e| {
                if e.target.is_empty() {
                    e.operation.len()
                } else {
                    e.operation.len() + e.target.len() + 3
                }
            })
            .max()
            .unwrap_or(0)
            .min(60);

        for e in &entries {
            let op_target = if e.target.is_empty() {
                e.operation.clone()
            } else {
                format!("{} ({})", e.operation, e.target)
            };

            let colour = color_for_operation(&e.operation);
            println!(
                "{:>5}  {}  {}  {}",
                e.id,
                e.date,
                colour.paint(format!("{op_target:<op_width$}")),
                e.message
            );
        }

        Ok(())
    }
}
