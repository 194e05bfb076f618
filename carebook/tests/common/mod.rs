//! Common test utilities for integration tests.
//!
//! Every test gets its own database file in a temporary directory, seeded
//! with the default state catalog and three users.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tempfile::TempDir;

use carebook::database::{Database, DatabaseConfig};
use carebook::notify::{NotificationDispatcher, NotificationSink};
use carebook::{CreateOptions, Money, PetId, ReservationEngine, UserId, UserRole};

/// A seeded database on disk.
#[allow(dead_code)]
pub struct TestEnv {
    pub dir: TempDir,
    pub path: PathBuf,
    pub client: UserId,
    pub caregiver: UserId,
    pub pending_caregiver: UserId,
}

#[allow(dead_code)]
impl TestEnv {
    /// Creates and seeds a fresh database.
    pub fn new() -> Self {
        Self::with_states(true)
    }

    /// Creates a database with users but, unless `seed` is set, no states.
    pub fn with_states(seed: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carebook.db");
        let mut db = Database::open(DatabaseConfig::new(&path)).unwrap();
        if seed {
            db.seed_states().unwrap();
        }

        let conn = db.connection();
        let client = Database::insert_user(conn, "Ana", UserRole::Client, Money::ZERO).unwrap();
        let caregiver = Database::insert_user(
            conn,
            "Bruno",
            UserRole::EnabledCaregiver,
            Money::from_cents(2500),
        )
        .unwrap();
        let pending_caregiver = Database::insert_user(
            conn,
            "Carla",
            UserRole::PendingCaregiver,
            Money::from_cents(1800),
        )
        .unwrap();

        Self {
            dir,
            path,
            client,
            caregiver,
            pending_caregiver,
        }
    }

    pub fn db_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.path)
    }

    /// A raw connection for assertions and fault injection.
    pub fn database(&self) -> Database {
        Database::open(self.db_config()).unwrap()
    }

    /// An engine with inline delivery to `sink`.
    pub fn engine(&self, sink: Arc<dyn NotificationSink>) -> ReservationEngine {
        ReservationEngine::open(self.db_config(), NotificationDispatcher::inline(sink)).unwrap()
    }

    /// An engine that drops notifications.
    pub fn quiet_engine(&self) -> ReservationEngine {
        ReservationEngine::open(self.db_config(), NotificationDispatcher::disabled()).unwrap()
    }

    /// Daily 09:00 slots for the enabled caregiver and one pet.
    pub fn booking(&self, start: NaiveDate, end: NaiveDate) -> CreateOptions {
        CreateOptions::new(self.client, self.caregiver, start, end)
            .with_pets(vec![PetId::new(11)])
            .with_daily_slots(9)
            .unwrap()
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: &str) -> i64 {
        self.database()
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }
}

/// Shorthand for a calendar day.
#[allow(dead_code)]
pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Polls `condition` until it holds or `timeout` passes.
#[allow(dead_code)]
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
