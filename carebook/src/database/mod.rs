//! Database layer for persistent storage of reservations.
//!
//! This module provides a SQLite-based storage layer: connection management,
//! schema versioning, and the row-level operations the engine composes into
//! transactions. Most operations are associated functions taking a
//! `&Connection` so they work the same on a plain connection and inside a
//! transaction.
//!
//! # Examples
//!
//! ```no_run
//! use carebook::database::{Database, DatabaseConfig};
//!
//! let mut db = Database::open(DatabaseConfig::new("/tmp/carebook.db")).unwrap();
//! db.seed_states().unwrap();
//!
//! for reservation in Database::list_all_reservations(db.connection()).unwrap() {
//!     println!("{} {}", reservation.id(), reservation.status());
//! }
//! ```

mod config;
mod connection;
pub mod migrations;
mod reservations;
mod schema;
mod slots;
mod states;
mod users;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::{
    default_data_dir, resolve_database_path, DatabaseConfig, DATABASE_FILE_NAME, DATA_DIR_ENV,
};
pub use connection::Database;
pub use migrations::{check_schema_compatibility, get_schema_version, initialize_schema};
pub use reservations::NewReservation;
