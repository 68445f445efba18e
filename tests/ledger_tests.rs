//! Library-level tests for the ledger guarantees that are awkward to
//! reach through the CLI: version guards, unique open session, audit rows.

use chrono::{TimeZone, Utc};
use shifttracker::config::Config;
use shifttracker::core::service::{self, EventStamp, GeoPing};
use shifttracker::db::initialize::init_db;
use shifttracker::db::pool::DbPool;
use shifttracker::db::queries::{self, NewAssignment};
use shifttracker::errors::AppError;
use shifttracker::models::session_state::SessionState;

mod common;
use common::setup_test_db;

fn open_pool(name: &str) -> DbPool {
    let db_path = setup_test_db(name);
    let pool = DbPool::new(&db_path).expect("open db");
    init_db(&pool.conn).expect("init schema");
    pool
}

fn test_config() -> Config {
    Config {
        database: String::new(),
        default_geofence_radius_ft: 250.0,
        certify_tolerance_minutes: 6,
        display_unit: "feet".to_string(),
    }
}

fn make_assignment(pool: &DbPool) -> i64 {
    queries::insert_assignment(
        &pool.conn,
        &NewAssignment {
            worker_id: "w-100",
            site_name: "Courthouse Renovation",
            site_latitude: common::SITE_LAT,
            site_longitude: common::SITE_LON,
            geofence_radius_m: 76.2,
            scheduled_start: None,
            scheduled_end: None,
        },
    )
    .expect("insert assignment")
}

fn ping(lat: f64, key: &str, hour: u32, minute: u32) -> GeoPing {
    GeoPing {
        latitude: lat,
        longitude: common::SITE_LON,
        accuracy_m: Some(8.0),
        client_time: Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap(),
        idempotency_key: key.to_string(),
    }
}

#[test]
fn stale_version_guard_rejects_checkout() {
    let mut pool = open_pool("ledger_version_guard");
    let assignment = make_assignment(&pool);

    let outcome = service::check_in(&mut pool, assignment, &ping(common::NEAR_LAT, "ci", 9, 0))
        .expect("check in");
    assert_eq!(outcome.session.version, 1);

    let err = service::check_out(
        &mut pool,
        assignment,
        &ping(common::NEAR_LAT, "co", 17, 0),
        Some(99),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::VersionConflict {
            expected: 99,
            actual: 1,
            ..
        }
    ));

    // The conflict happened before acceptance: no check_out event row.
    let events = queries::list_events_by_assignment(&pool.conn, assignment).unwrap();
    assert_eq!(events.len(), 1);

    // The correct version goes through.
    service::check_out(
        &mut pool,
        assignment,
        &ping(common::NEAR_LAT, "co2", 17, 0),
        Some(1),
    )
    .expect("check out with current version");
}

#[test]
fn guarded_update_detects_concurrent_writer() {
    let mut pool = open_pool("ledger_concurrent_update");
    let assignment = make_assignment(&pool);

    let outcome = service::check_in(&mut pool, assignment, &ping(common::NEAR_LAT, "ci", 9, 0))
        .expect("check in");
    let snapshot = outcome.session;

    // A break bumps the version behind the snapshot's back.
    let stamp = EventStamp {
        client_time: Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap(),
        idempotency_key: "bs".to_string(),
    };
    service::break_start(
        &mut pool,
        snapshot.id,
        shifttracker::models::break_type::BreakType::Meal,
        &stamp,
        None,
    )
    .expect("break start");

    let err =
        queries::update_session_guarded(&pool.conn, &snapshot, SessionState::Cancelled, None)
            .unwrap_err();
    assert!(matches!(err, AppError::VersionConflict { .. }));
}

#[test]
fn schema_enforces_one_open_session_per_assignment() {
    let pool = open_pool("ledger_one_open");
    let assignment_id = make_assignment(&pool);
    let assignment = queries::get_assignment(&pool.conn, assignment_id).unwrap();

    let t = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
    queries::insert_session(&pool.conn, &assignment, t).expect("first session");

    // Bypassing the service must still hit the partial unique index.
    let second = queries::insert_session(&pool.conn, &assignment, t);
    assert!(second.is_err());
}

#[test]
fn rejected_attempts_are_recorded_with_reason() {
    let mut pool = open_pool("ledger_reject_audit");
    let assignment = make_assignment(&pool);

    let err = service::check_in(&mut pool, assignment, &ping(common::FAR_LAT, "far", 9, 0))
        .unwrap_err();
    assert!(matches!(err, AppError::OutsideGeofence { .. }));

    let events = queries::list_events_by_assignment(&pool.conn, assignment).unwrap();
    assert_eq!(events.len(), 1);
    let ev = &events[0];
    assert!(!ev.accepted);
    assert_eq!(ev.reject_reason, "outside_geofence");
    assert_eq!(ev.session_id, None);
    assert_eq!(ev.within_geofence, Some(false));
    assert!(ev.distance_m.unwrap() > 76.2);
}

#[test]
fn certification_closes_and_records_computed_hours() {
    let mut pool = open_pool("ledger_certify");
    let cfg = test_config();
    let assignment = make_assignment(&pool);

    service::check_in(&mut pool, assignment, &ping(common::NEAR_LAT, "ci", 9, 0)).unwrap();
    service::check_out(
        &mut pool,
        assignment,
        &ping(common::NEAR_LAT, "co", 17, 30),
        None,
    )
    .unwrap();

    let session = queries::find_open_session(&pool.conn, assignment)
        .unwrap()
        .expect("pending session");
    assert_eq!(session.state, SessionState::PendingCertification);

    let req = shifttracker::core::certify::CertifyRequest {
        attested_hours: 9.5,
        attested_break_count: None,
        signer_name: "Dana Smith",
        attested: true,
    };
    let result = service::certify(&mut pool, &cfg, session.id, &req, None).unwrap();

    assert_eq!(result.session.state, SessionState::Closed);
    assert!(result.certification.hours_mismatch);
    assert!((result.certification.computed_hours - 8.5).abs() < 1e-9);
    assert!((result.certification.attested_hours - 9.5).abs() < 1e-9);

    // Closed sessions no longer count as open.
    assert!(
        queries::find_open_session(&pool.conn, assignment)
            .unwrap()
            .is_none()
    );
}
