//! Notification delivery never affects transition outcomes.

mod common;

use std::fs;
use std::sync::Arc;

use carebook::notify::{
    DispatchMode, JsonLinesSink, NotificationDispatcher, RecordingSink, StatusChangeEvent,
};
use carebook::{ReservationEngine, ReservationStatus};
use common::{day, TestEnv};

#[test]
fn test_failing_background_sink_is_counted_not_raised() {
    let env = TestEnv::new();
    let sink = Arc::new(RecordingSink::failing());
    let notifier = NotificationDispatcher::new(DispatchMode::Background, sink.clone()).unwrap();
    let mut engine = ReservationEngine::open(env.db_config(), notifier).unwrap();

    let id = engine
        .create(env.booking(day(2024, 2, 1), day(2024, 2, 2)))
        .unwrap()
        .id();
    assert_eq!(
        engine.approve(id).unwrap().status(),
        ReservationStatus::Approved
    );
    assert_eq!(
        engine.cancel(id).unwrap().status(),
        ReservationStatus::Cancelled
    );

    let stats = engine.notifier().shared_stats();
    engine.shutdown();
    // Both events were attempted by the time shutdown returns
    assert_eq!(stats.failed(), 2);
    assert_eq!(stats.delivered(), 0);
    assert!(sink.events().is_empty());
}

#[test]
fn test_outbox_receives_one_line_per_change() {
    let env = TestEnv::new();
    let outbox = env.dir.path().join("outbox.jsonl");
    let notifier = NotificationDispatcher::inline(Arc::new(JsonLinesSink::new(&outbox)));
    let mut engine = ReservationEngine::open(env.db_config(), notifier).unwrap();

    let id = engine
        .create(env.booking(day(2024, 2, 1), day(2024, 2, 2)))
        .unwrap()
        .id();
    engine.approve(id).unwrap();
    engine.annul(id).unwrap();

    let contents = fs::read_to_string(&outbox).unwrap();
    let events: Vec<StatusChangeEvent> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].status, ReservationStatus::Approved);
    assert_eq!(events[1].previous, ReservationStatus::Approved);
    assert_eq!(events[1].status, ReservationStatus::Annulled);
    assert!(events.iter().all(|e| e.reservation == id));
}

#[test]
fn test_unwritable_outbox_does_not_block_transitions() {
    let env = TestEnv::new();
    // A directory where the file should be makes every append fail
    let outbox = env.dir.path().join("outbox-dir");
    fs::create_dir(&outbox).unwrap();
    let notifier = NotificationDispatcher::inline(Arc::new(JsonLinesSink::new(&outbox)));
    let mut engine = ReservationEngine::open(env.db_config(), notifier).unwrap();

    let id = engine
        .create(env.booking(day(2024, 2, 1), day(2024, 2, 2)))
        .unwrap()
        .id();
    engine.reject(id).unwrap();

    assert_eq!(engine.notifier().stats().failed(), 1);
    assert_eq!(engine.get(id).unwrap().status(), ReservationStatus::Rejected);
}

#[test]
fn test_disabled_dispatcher_drops_events() {
    let env = TestEnv::new();
    let mut engine = env.quiet_engine();
    let id = engine
        .create(env.booking(day(2024, 2, 1), day(2024, 2, 2)))
        .unwrap()
        .id();
    engine.approve(id).unwrap();
    assert_eq!(engine.notifier().stats().delivered(), 0);
    assert_eq!(engine.notifier().stats().failed(), 0);
}
