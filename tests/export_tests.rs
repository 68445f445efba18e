use predicates::str::contains;
use std::fs;

mod common;
use common::{init_with_assignment, run_full_shift, setup_test_db, stk, temp_out};

fn certify_shift(db_path: &str) {
    stk()
        .args([
            "--db",
            db_path,
            "certify",
            "1",
            "--hours",
            "8.0",
            "--signer",
            "Dana Smith",
            "--attested",
        ])
        .assert()
        .success();
}

#[test]
fn test_export_csv_closed_sessions() {
    let db_path = setup_test_db("export_csv");
    init_with_assignment(&db_path);
    run_full_shift(&db_path);
    certify_shift(&db_path);

    let out = temp_out("export_csv", "csv");

    stk()
        .args([
            "--db", &db_path, "export", "--format", "csv", "--file", &out, "--force",
        ])
        .assert()
        .success()
        .stdout(contains("CSV export completed"));

    let content = fs::read_to_string(&out).expect("read csv");
    let mut lines = content.lines();
    let header = lines.next().expect("csv header");
    assert!(header.contains("payable_hours"));
    assert!(header.contains("hours_mismatch"));

    let row = lines.next().expect("csv data row");
    assert!(row.contains("w-100"));
    assert!(row.contains("closed"));
    assert!(row.contains("8.0"));
    assert!(row.contains("Dana Smith"));
}

#[test]
fn test_export_json_recomputes_payable_hours() {
    let db_path = setup_test_db("export_json");
    init_with_assignment(&db_path);
    run_full_shift(&db_path);

    // Certify with inflated hours: the export must carry the ledger's 8.0.
    stk()
        .args([
            "--db",
            &db_path,
            "certify",
            "1",
            "--hours",
            "9.5",
            "--signer",
            "Dana Smith",
            "--attested",
        ])
        .assert()
        .success();

    let out = temp_out("export_json", "json");

    stk()
        .args([
            "--db", &db_path, "export", "--format", "json", "--file", &out, "--force",
        ])
        .assert()
        .success()
        .stdout(contains("JSON export completed"));

    let content = fs::read_to_string(&out).expect("read json");
    let rows: serde_json::Value = serde_json::from_str(&content).expect("parse json");
    let row = &rows.as_array().expect("array")[0];

    assert_eq!(row["worker_id"], "w-100");
    assert_eq!(row["payable_minutes"], 480);
    assert!((row["payable_hours"].as_f64().unwrap() - 8.0).abs() < 1e-9);
    assert!((row["attested_hours"].as_f64().unwrap() - 9.5).abs() < 1e-9);
    assert_eq!(row["hours_mismatch"], true);
    assert_eq!(row["certified"], true);
}

#[test]
fn test_export_skips_open_sessions_unless_all() {
    let db_path = setup_test_db("export_open");
    init_with_assignment(&db_path);
    run_full_shift(&db_path); // pending_certification, not closed

    let out = temp_out("export_open_default", "csv");

    stk()
        .args([
            "--db", &db_path, "export", "--format", "csv", "--file", &out, "--force",
        ])
        .assert()
        .success()
        .stdout(contains("No sessions found"));

    let out_all = temp_out("export_open_all", "csv");

    stk()
        .args([
            "--db", &db_path, "export", "--format", "csv", "--file", &out_all, "--all", "--force",
        ])
        .assert()
        .success()
        .stdout(contains("CSV export completed"));

    let content = fs::read_to_string(&out_all).expect("read csv");
    assert!(content.contains("pending_certification"));
}

#[test]
fn test_export_requires_absolute_path() {
    let db_path = setup_test_db("export_relpath");
    init_with_assignment(&db_path);

    stk()
        .args([
            "--db", &db_path, "export", "--format", "csv", "--file", "relative.csv", "--force",
        ])
        .assert()
        .failure()
        .stderr(contains("must be absolute"));
}
