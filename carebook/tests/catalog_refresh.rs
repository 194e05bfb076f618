//! The state catalog is data, not code: entries added or replaced outside
//! the engine are picked up without a restart.

mod common;

use std::thread;
use std::time::Duration;

use carebook::database::Database;
use carebook::{Error, ReservationStatus, StateCatalog};
use common::{day, TestEnv};

#[test]
fn test_missing_state_added_later_is_found_on_miss() {
    let env = TestEnv::with_states(false);
    let db = env.database();
    for name in ["Pending", "Approved"] {
        Database::insert_state(db.connection(), name).unwrap();
    }

    let mut engine = env.quiet_engine();
    let id = engine
        .create(env.booking(day(2024, 12, 1), day(2024, 12, 2)))
        .unwrap()
        .id();
    engine.approve(id).unwrap();

    let err = engine.annul(id).unwrap_err();
    assert!(matches!(err, Error::StateNotFound { ref name } if name == "Annulled"));
    assert_eq!(engine.get(id).unwrap().status(), ReservationStatus::Approved);

    Database::insert_state(db.connection(), "Annulled").unwrap();
    let annulled = engine.annul(id).unwrap();
    assert_eq!(annulled.status(), ReservationStatus::Annulled);
}

#[test]
fn test_cached_entries_reload_after_interval() {
    let env = TestEnv::new();
    let db = env.database();
    let mut catalog = StateCatalog::new(Duration::from_millis(50));

    let before = catalog
        .resolve(db.connection(), ReservationStatus::Completed)
        .unwrap();

    // Retire the entry and add a replacement with a new identifier
    db.connection()
        .execute_batch(
            "UPDATE states SET name = 'Completed (retired)' WHERE name = 'Completed';
             INSERT INTO states (name) VALUES ('Completed');",
        )
        .unwrap();

    let cached = catalog
        .resolve(db.connection(), ReservationStatus::Completed)
        .unwrap();
    assert_eq!(cached, before);

    thread::sleep(Duration::from_millis(80));
    assert!(catalog.is_stale());
    let reloaded = catalog
        .resolve(db.connection(), ReservationStatus::Completed)
        .unwrap();
    assert_ne!(reloaded, before);
}

#[test]
fn test_seeding_is_idempotent() {
    let env = TestEnv::new();
    let mut db = env.database();
    assert_eq!(db.seed_states().unwrap(), 0);
    assert_eq!(
        Database::load_states(db.connection()).unwrap().len(),
        ReservationStatus::ALL.len()
    );
}
