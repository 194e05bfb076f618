use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use tempfile::TempDir;

use carebook::database::{Database, DatabaseConfig};
use carebook::notify::NotificationDispatcher;
use carebook::{
    CreateOptions, Money, PetId, ReconciliationSweep, ReservationEngine, UserId, UserRole,
};

const RANGE_LENGTHS: &[i64] = &[1, 7, 30];
const SWEEP_SIZES: &[usize] = &[10, 100, 250];

struct Fixture {
    _dir: TempDir,
    engine: ReservationEngine,
    client: UserId,
    caregiver: UserId,
}

fn setup() -> Fixture {
    let dir = TempDir::new().expect("failed to create temporary directory");
    let config = DatabaseConfig::new(dir.path().join("carebook.db"));

    let mut db = Database::open(config.clone()).expect("failed to open temporary database");
    db.seed_states().expect("failed to seed states");
    let conn = db.connection();
    let client = Database::insert_user(conn, "client", UserRole::Client, Money::ZERO)
        .expect("failed to insert client");
    let caregiver = Database::insert_user(
        conn,
        "caregiver",
        UserRole::EnabledCaregiver,
        Money::from_cents(2000),
    )
    .expect("failed to insert caregiver");

    let engine = ReservationEngine::open(config, NotificationDispatcher::disabled())
        .expect("failed to open engine");
    Fixture {
        _dir: dir,
        engine,
        client,
        caregiver,
    }
}

fn booking(fixture: &Fixture, start: NaiveDate, days: i64) -> CreateOptions {
    CreateOptions::new(
        fixture.client,
        fixture.caregiver,
        start,
        start + Duration::days(days - 1),
    )
    .with_pets(vec![PetId::new(1)])
    .with_daily_slots(10)
    .expect("valid hour")
}

fn first_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
}

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");

    for &days in RANGE_LENGTHS {
        group.bench_with_input(BenchmarkId::from_parameter(days), &days, |b, &days| {
            let mut fixture = setup();
            b.iter(|| {
                let options = booking(&fixture, first_day(), days);
                black_box(fixture.engine.create(options).expect("create failed"));
            });
        });
    }

    group.finish();
}

fn bench_transitions(c: &mut Criterion) {
    c.bench_function("create_approve_cancel", |b| {
        let mut fixture = setup();
        b.iter(|| {
            let options = booking(&fixture, first_day(), 7);
            let id = fixture.engine.create(options).expect("create failed").id();
            fixture.engine.approve(id).expect("approve failed");
            black_box(fixture.engine.cancel(id).expect("cancel failed"));
        });
    });
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");
    let now = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .expect("valid instant");

    for &count in SWEEP_SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let mut fixture = setup();
                    for _ in 0..count {
                        let options = booking(&fixture, first_day(), 3);
                        let id = fixture.engine.create(options).expect("create failed").id();
                        fixture.engine.approve(id).expect("approve failed");
                    }
                    fixture
                },
                |mut fixture| {
                    let report =
                        ReconciliationSweep::run(&mut fixture.engine, now).expect("sweep failed");
                    assert_eq!(report.completed.len(), count);
                },
                BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_create, bench_transitions, bench_sweep);
criterion_main!(benches);
