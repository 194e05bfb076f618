#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # carebook
//!
//! A reservation lifecycle engine for caregiving appointments.
//!
//! A client books a caregiver for a range of days, one appointment slot per
//! day. The engine creates the reservation and its slots atomically, moves it
//! through a fixed status machine with compare-and-swap writes, and a
//! periodic sweep completes approved reservations once their range has
//! elapsed. Every committed status change is handed to a
//! [`NotificationSink`](notify::NotificationSink) without ever failing the
//! transition.
//!
//! ## Core Types
//!
//! - [`Reservation`], [`DateRange`] and [`Money`]: the booked record
//! - [`ReservationStatus`] and [`Transition`]: the state machine
//! - [`ReservationEngine`]: creation, transitions and queries
//! - [`ReconciliationSweep`]: the completion pass
//! - [`Error`], [`ErrorKind`] and [`Result`]: error handling
//!
//! ## Examples
//!
//! ```
//! use carebook::{ReservationStatus, Transition};
//!
//! assert!(Transition::Cancel.allowed_from(ReservationStatus::Approved));
//! assert!(!Transition::Annul.allowed_from(ReservationStatus::Pending));
//! assert_eq!(Transition::Reject.target(), Some(ReservationStatus::Rejected));
//! ```

pub mod catalog;
pub mod config;
pub mod database;
pub mod directory;
pub mod engine;
pub mod error;
pub mod logging;
pub mod notify;
pub mod reservation;
pub mod slot;
pub mod status;
pub mod sweep;

pub use catalog::{StateCatalog, StateId};
pub use config::{Config, ConfigBuilder};
pub use database::{Database, DatabaseConfig};
pub use directory::{CaregiverDirectory, CaregiverProfile, InMemoryDirectory, User, UserRole};
pub use engine::{CreateOptions, ReservationEngine};
pub use error::{Error, ErrorKind, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use reservation::{DateRange, Money, PetId, Reservation, ReservationId, UserId};
pub use slot::{Slot, SlotId, SlotRequest};
pub use status::{ReservationStatus, Transition};
pub use sweep::{ReconciliationSweep, SweepReport};
