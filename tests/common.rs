#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Courthouse test site and two device positions relative to it:
/// one ~50 m north (inside the default 250 ft fence), one ~120 m north.
pub const SITE_LAT: f64 = 36.1627;
pub const SITE_LON: f64 = -86.7816;
pub const NEAR_LAT: f64 = 36.16315;
pub const FAR_LAT: f64 = 36.16378;

pub fn stk() -> Command {
    cargo_bin_cmd!("shifttracker")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_shifttracker.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Initialize the DB and create assignment 1 for worker w-100 at the test site
pub fn init_with_assignment(db_path: &str) {
    stk()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();

    stk()
        .args([
            "--db",
            db_path,
            "assign",
            "--worker",
            "w-100",
            "--site",
            "Courthouse Renovation",
            "--lat",
            "36.1627",
            "--lon=-86.7816",
        ])
        .assert()
        .success();
}

/// Run a full within-geofence shift on assignment 1:
/// 09:00 in, 12:00–12:30 meal break, 17:30 out (payable 8h).
pub fn run_full_shift(db_path: &str) {
    stk()
        .args([
            "--db",
            db_path,
            "checkin",
            "1",
            "--lat",
            "36.16315",
            "--lon=-86.7816",
            "--at",
            "2025-06-02T09:00:00Z",
            "--key",
            "shift-ci",
        ])
        .assert()
        .success();

    stk()
        .args([
            "--db",
            db_path,
            "break",
            "1",
            "--start",
            "meal",
            "--at",
            "2025-06-02T12:00:00Z",
            "--key",
            "shift-b1",
        ])
        .assert()
        .success();

    stk()
        .args([
            "--db",
            db_path,
            "break",
            "1",
            "--end",
            "--at",
            "2025-06-02T12:30:00Z",
            "--key",
            "shift-b2",
        ])
        .assert()
        .success();

    stk()
        .args([
            "--db",
            db_path,
            "checkout",
            "1",
            "--lat",
            "36.16315",
            "--lon=-86.7816",
            "--at",
            "2025-06-02T17:30:00Z",
            "--key",
            "shift-co",
        ])
        .assert()
        .success();
}
