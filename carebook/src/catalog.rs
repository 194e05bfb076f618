//! In-memory cache of the persisted state catalog.
//!
//! Status identifiers are assigned by whoever seeds the `states` table, so
//! the engine never hardcodes them. The catalog loads the table once, serves
//! lookups from memory and reloads after `refresh_interval` has passed. A
//! lookup that misses forces one reload before giving up. Names match the
//! way [`ReservationStatus`] parses them: trimmed, ignoring ASCII case.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{Error, Result};
use crate::status::ReservationStatus;

/// Default interval between catalog reloads.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Identifier of a row in the `states` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(i64);

impl StateId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name-to-identifier cache of the `states` table.
///
/// # Examples
///
/// ```no_run
/// use carebook::database::{Database, DatabaseConfig};
/// use carebook::{ReservationStatus, StateCatalog};
/// use std::time::Duration;
///
/// let mut db = Database::open(DatabaseConfig::new("/tmp/carebook.db")).unwrap();
/// db.seed_states().unwrap();
///
/// let mut catalog = StateCatalog::new(Duration::from_secs(300));
/// let pending = catalog.resolve(db.connection(), ReservationStatus::Pending).unwrap();
/// println!("Pending is state {pending}");
/// ```
#[derive(Debug)]
pub struct StateCatalog {
    by_name: HashMap<String, StateId>,
    loaded_at: Option<Instant>,
    refresh_interval: Duration,
}

impl StateCatalog {
    /// Creates an empty catalog that reloads every `refresh_interval`.
    #[must_use]
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            by_name: HashMap::new(),
            loaded_at: None,
            refresh_interval,
        }
    }

    /// Resolves a status to its persisted identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateNotFound`] if the name is absent even after a
    /// forced reload, or a storage error if the reload fails.
    pub fn resolve(&mut self, conn: &Connection, status: ReservationStatus) -> Result<StateId> {
        let mut refreshed = false;
        if self.is_stale() {
            self.refresh(conn)?;
            refreshed = true;
        }

        let key = name_key(status.name());
        if let Some(id) = self.by_name.get(&key) {
            return Ok(*id);
        }

        if !refreshed {
            log::debug!("state '{status}' missing from cached catalog, reloading");
            self.refresh(conn)?;
            if let Some(id) = self.by_name.get(&key) {
                return Ok(*id);
            }
        }

        Err(Error::StateNotFound {
            name: status.name().to_string(),
        })
    }

    /// Reloads every entry from the `states` table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn refresh(&mut self, conn: &Connection) -> Result<()> {
        let states = Database::load_states(conn)?;
        log::debug!("loaded {} states into catalog", states.len());
        self.by_name = states
            .into_iter()
            .map(|(id, name)| (name_key(&name), id))
            .collect();
        self.loaded_at = Some(Instant::now());
        Ok(())
    }

    /// Whether the next lookup will reload the table first.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.loaded_at
            .map_or(true, |at| at.elapsed() >= self.refresh_interval)
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl Default for StateCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}
