use predicates::str::contains;
use std::fs;

mod common;
use common::{init_with_assignment, run_full_shift, setup_test_db, stk, temp_out};

fn write_batch(name: &str, json: &str) -> String {
    let path = temp_out(name, "json");
    fs::write(&path, json).expect("write sync batch");
    path
}

const FULL_DAY_BATCH: &str = r#"[
  {"assignment_id": 1, "kind": "check_in", "latitude": 36.16315, "longitude": -86.7816,
   "client_time": "2025-06-02T09:00:00Z", "idempotency_key": "q-ci"},
  {"assignment_id": 1, "kind": "break_start", "break_kind": "meal",
   "client_time": "2025-06-02T12:00:00Z", "idempotency_key": "q-bs"},
  {"assignment_id": 1, "kind": "break_end",
   "client_time": "2025-06-02T12:30:00Z", "idempotency_key": "q-be"},
  {"assignment_id": 1, "kind": "check_out", "latitude": 36.16315, "longitude": -86.7816,
   "client_time": "2025-06-02T17:30:00Z", "idempotency_key": "q-co"}
]"#;

#[test]
fn test_sync_applies_a_full_offline_day() {
    let db_path = setup_test_db("sync_full_day");
    init_with_assignment(&db_path);

    let batch = write_batch("sync_full_day", FULL_DAY_BATCH);

    stk()
        .args(["--db", &db_path, "sync", "--file", &batch])
        .assert()
        .success()
        .stdout(contains("4 of 4 applied"));

    stk()
        .args(["--db", &db_path, "sessions"])
        .assert()
        .success()
        .stdout(contains("pending_certification"))
        .stdout(contains("8h 00m"));
}

#[test]
fn test_sync_replay_is_exactly_once() {
    let db_path = setup_test_db("sync_replay");
    init_with_assignment(&db_path);

    let batch = write_batch("sync_replay", FULL_DAY_BATCH);

    stk()
        .args(["--db", &db_path, "sync", "--file", &batch])
        .assert()
        .success()
        .stdout(contains("4 of 4 applied"));

    // Same file again: every event is a known key, nothing changes.
    stk()
        .args(["--db", &db_path, "sync", "--file", &batch])
        .assert()
        .success()
        .stdout(contains("0 of 4 applied"))
        .stdout(contains("4 duplicates"));

    stk()
        .args(["--db", &db_path, "sessions"])
        .assert()
        .success()
        .stdout(contains("pending_certification").count(1));
}

#[test]
fn test_sync_batch_is_replayed_in_client_time_order() {
    let db_path = setup_test_db("sync_ordering");
    init_with_assignment(&db_path);

    // Deliberately shuffled: check_out first, check_in last.
    let shuffled = r#"[
      {"assignment_id": 1, "kind": "check_out", "latitude": 36.16315, "longitude": -86.7816,
       "client_time": "2025-06-02T17:30:00Z", "idempotency_key": "s-co"},
      {"assignment_id": 1, "kind": "break_end",
       "client_time": "2025-06-02T12:30:00Z", "idempotency_key": "s-be"},
      {"assignment_id": 1, "kind": "break_start", "break_kind": "rest",
       "client_time": "2025-06-02T12:00:00Z", "idempotency_key": "s-bs"},
      {"assignment_id": 1, "kind": "check_in", "latitude": 36.16315, "longitude": -86.7816,
       "client_time": "2025-06-02T09:00:00Z", "idempotency_key": "s-ci"}
    ]"#;
    let batch = write_batch("sync_ordering", shuffled);

    stk()
        .args(["--db", &db_path, "sync", "--file", &batch])
        .assert()
        .success()
        .stdout(contains("4 of 4 applied"));
}

#[test]
fn test_sync_stale_checkin_replay_is_rejected_and_audited() {
    let db_path = setup_test_db("sync_stale");
    init_with_assignment(&db_path);
    run_full_shift(&db_path);

    // A queued check_in from before the shift ended must not reopen it.
    let stale = r#"[
      {"assignment_id": 1, "kind": "check_in", "latitude": 36.16315, "longitude": -86.7816,
       "client_time": "2025-06-02T08:00:00Z", "idempotency_key": "stale-ci"}
    ]"#;
    let batch = write_batch("sync_stale", stale);

    stk()
        .args(["--db", &db_path, "sync", "--file", &batch])
        .assert()
        .success()
        .stdout(contains("1 rejected"))
        .stdout(contains("Stale event"));

    stk()
        .args(["--db", &db_path, "history", "1"])
        .assert()
        .success()
        .stdout(contains("stale_event"));

    // Still a single session for the assignment.
    stk()
        .args(["--db", &db_path, "sessions", "--assignment", "1"])
        .assert()
        .success()
        .stdout(contains("pending_certification").count(1));
}

#[test]
fn test_sync_outside_geofence_event_is_rejected_not_fatal() {
    let db_path = setup_test_db("sync_fence_reject");
    init_with_assignment(&db_path);

    let mixed = r#"[
      {"assignment_id": 1, "kind": "check_in", "latitude": 36.16378, "longitude": -86.7816,
       "client_time": "2025-06-02T09:00:00Z", "idempotency_key": "m-ci-far"},
      {"assignment_id": 1, "kind": "check_in", "latitude": 36.16315, "longitude": -86.7816,
       "client_time": "2025-06-02T09:05:00Z", "idempotency_key": "m-ci-near"}
    ]"#;
    let batch = write_batch("sync_fence_reject", mixed);

    stk()
        .args(["--db", &db_path, "sync", "--file", &batch])
        .assert()
        .success()
        .stdout(contains("1 of 2 applied"))
        .stdout(contains("1 rejected"))
        .stdout(contains("Outside geofence"));

    stk()
        .args(["--db", &db_path, "sessions"])
        .assert()
        .success()
        .stdout(contains("active").count(1));
}

#[test]
fn test_sync_positionless_checkin_is_rejected_and_ledgered() {
    let db_path = setup_test_db("sync_no_position");
    init_with_assignment(&db_path);

    // A check_in queued without coordinates cannot be validated, but it
    // must still land in the audit trail as a rejected row.
    let positionless = r#"[
      {"assignment_id": 1, "kind": "check_in",
       "client_time": "2025-06-02T09:00:00Z", "idempotency_key": "np-ci"}
    ]"#;
    let batch = write_batch("sync_no_position", positionless);

    stk()
        .args(["--db", &db_path, "sync", "--file", &batch])
        .assert()
        .success()
        .stdout(contains("0 of 1 applied"))
        .stdout(contains("1 rejected"));

    stk()
        .args(["--db", &db_path, "history", "1"])
        .assert()
        .success()
        .stdout(contains("invalid_coordinate"));

    // No session was opened for the assignment.
    stk()
        .args(["--db", &db_path, "sessions", "--assignment", "1"])
        .assert()
        .success()
        .stdout(contains("No sessions match"));
}

#[test]
fn test_sync_invalid_file_fails_cleanly() {
    let db_path = setup_test_db("sync_bad_file");
    init_with_assignment(&db_path);

    let batch = write_batch("sync_bad_file", "not json at all");

    stk()
        .args(["--db", &db_path, "sync", "--file", &batch])
        .assert()
        .failure()
        .stderr(contains("Invalid sync batch"));
}
