//! The reservation lifecycle engine.
//!
//! [`ReservationEngine`] owns a database connection, the state catalog, the
//! caregiver directory and the notification dispatcher. Creation and every
//! transition run as a single `IMMEDIATE` transaction; transitions write
//! with a compare-and-swap on the state column so two callers acting on the
//! same stale status cannot both win.

mod create;
mod transition;

#[cfg(test)]
mod proptests;

use std::time::Duration;

use chrono::NaiveDate;

use crate::catalog::StateCatalog;
use crate::database::{Database, DatabaseConfig};
use crate::directory::{CaregiverDirectory, SqliteDirectory};
use crate::error::{Error, Result};
use crate::notify::NotificationDispatcher;
use crate::reservation::{DateRange, Reservation, ReservationId, UserId};
use crate::slot::Slot;
use crate::status::ReservationStatus;

pub use create::{CreateOptions, ValidatedCreate};

/// Orchestrates reservation creation, transitions and queries.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use carebook::database::DatabaseConfig;
/// use carebook::engine::ReservationEngine;
/// use carebook::notify::{LogSink, NotificationDispatcher};
/// use carebook::ReservationId;
///
/// let dispatcher = NotificationDispatcher::inline(Arc::new(LogSink));
/// let mut engine = ReservationEngine::open(DatabaseConfig::new("/tmp/carebook.db"), dispatcher).unwrap();
/// let reservation = engine.approve(ReservationId::new(1)).unwrap();
/// println!("{} is now {}", reservation.id(), reservation.status());
/// ```
pub struct ReservationEngine {
    db: Database,
    catalog: StateCatalog,
    directory: Box<dyn CaregiverDirectory>,
    notifier: NotificationDispatcher,
}

impl std::fmt::Debug for ReservationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationEngine")
            .field("db", &self.db)
            .field("catalog", &self.catalog)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl ReservationEngine {
    /// Assembles an engine from its parts.
    #[must_use]
    pub fn new(
        db: Database,
        directory: Box<dyn CaregiverDirectory>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            db,
            catalog: StateCatalog::default(),
            directory,
            notifier,
        }
    }

    /// Opens the database and a `users`-table directory on a second
    /// connection to the same file.
    ///
    /// # Errors
    ///
    /// Returns an error if either connection cannot be opened.
    pub fn open(config: DatabaseConfig, notifier: NotificationDispatcher) -> Result<Self> {
        let db = Database::open(config.clone())?;
        let directory = SqliteDirectory::open(config)?;
        Ok(Self::new(db, Box::new(directory), notifier))
    }

    /// Sets how long catalog entries are trusted before a reload.
    #[must_use]
    pub fn with_catalog_refresh(mut self, interval: Duration) -> Self {
        self.catalog = StateCatalog::new(interval);
        self
    }

    /// The underlying database.
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// The underlying database, mutably.
    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    /// The notification dispatcher.
    #[must_use]
    pub const fn notifier(&self) -> &NotificationDispatcher {
        &self.notifier
    }

    /// Consumes the engine, flushing pending notifications.
    pub fn shutdown(self) {
        self.notifier.shutdown();
    }

    /// Loads a reservation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if it does not exist.
    pub fn get(&self, id: ReservationId) -> Result<Reservation> {
        Database::get_reservation(self.db.connection(), id)?.ok_or_else(|| not_found(id))
    }

    /// Every reservation booked by a client, earliest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_for_client(&self, client: UserId) -> Result<Vec<Reservation>> {
        Database::list_reservations_for_client(self.db.connection(), client)
    }

    /// Every reservation booked with a caregiver, earliest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_for_caregiver(&self, caregiver: UserId) -> Result<Vec<Reservation>> {
        Database::list_reservations_for_caregiver(self.db.connection(), caregiver)
    }

    /// Every reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all(&self) -> Result<Vec<Reservation>> {
        Database::list_all_reservations(self.db.connection())
    }

    /// Every slot of a reservation, deleted ones included, by time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the reservation does not exist.
    pub fn slots_for(&self, id: ReservationId) -> Result<Vec<Slot>> {
        self.get(id)?;
        Database::list_slots(self.db.connection(), id)
    }

    /// Hour of the reservation's first slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the reservation does not exist.
    pub fn appointment_hour(&self, id: ReservationId) -> Result<Option<u8>> {
        Ok(self.slots_for(id)?.first().map(Slot::hour))
    }

    /// Pending or approved reservations of a caregiver intersecting the
    /// given days.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `start > end`, or a storage error.
    pub fn reservations_in_range(
        &mut self,
        caregiver: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Reservation>> {
        let range = DateRange::new(start, end)?;
        let conn = self.db.connection();
        let live = [
            self.catalog.resolve(conn, ReservationStatus::Pending)?,
            self.catalog.resolve(conn, ReservationStatus::Approved)?,
        ];
        Database::find_overlapping_reservations(
            conn,
            caregiver,
            range.starts_at(),
            range.ends_at(),
            live,
        )
    }
}

fn not_found(id: ReservationId) -> Error {
    Error::NotFound {
        resource: format!("reservation {id}"),
    }
}
