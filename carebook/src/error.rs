//! Error types for the carebook library.
//!
//! This module provides the error hierarchy for every operation in the
//! library, using `thiserror` for ergonomic error handling. Every variant maps
//! to a stable [`ErrorKind`] so callers can react to the failure class without
//! parsing messages.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::reservation::ReservationId;
use crate::status::{ReservationStatus, Transition};

/// Result type alias for operations that may fail with a carebook error.
///
/// # Examples
///
/// ```
/// use carebook::{Error, Result};
///
/// fn example_operation() -> Result<u32> {
///     Ok(3)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the carebook library.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input: empty pet set, empty day list, inverted date range.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// The caregiver is unknown or lacks the enabled-caregiver capability.
    #[error("caregiver {caregiver} is not an enabled caregiver")]
    CaregiverNotEligible {
        /// The caregiver identifier that was rejected.
        caregiver: i64,
    },

    /// A required status name is missing from the state catalog.
    #[error("state '{name}' not found in catalog")]
    StateNotFound {
        /// The status name that could not be resolved.
        name: String,
    },

    /// A transition was attempted from a state that does not allow it.
    #[error("cannot {transition} reservation {reservation}: current state is {current}")]
    InvalidTransition {
        /// The reservation the transition targeted.
        reservation: ReservationId,
        /// The attempted transition.
        transition: Transition,
        /// The state the reservation was in.
        current: ReservationStatus,
    },

    /// The requested resource was not found.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// A storage error occurred.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A transition could not be written; the reservation is unchanged.
    ///
    /// The storage-layer error is kept as the source and stays out of the
    /// message.
    #[error("could not {transition} reservation {reservation}: storage unavailable")]
    TransitionStorage {
        /// The reservation the transition targeted.
        reservation: ReservationId,
        /// The attempted transition.
        transition: Transition,
        /// The underlying storage failure.
        #[source]
        source: rusqlite::Error,
    },

    /// A notification could not be delivered.
    ///
    /// Never returned from a transition; sinks report it to the dispatcher,
    /// which logs it.
    #[error("notification for reservation {reservation} failed: {details}")]
    Notification {
        /// The reservation the notification was about.
        reservation: ReservationId,
        /// Details about the delivery failure.
        details: String,
    },

    /// A configuration error occurred.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A database lock could not be acquired within the busy timeout.
    #[error("database lock timeout after {seconds}s")]
    LockTimeout {
        /// The number of seconds waited before timing out.
        seconds: u64,
    },

    /// An unsupported schema version was encountered.
    #[error("unsupported schema version: expected {expected}, found {found}")]
    UnsupportedSchemaVersion {
        /// The expected schema version.
        expected: i32,
        /// The schema version found in the database.
        found: i32,
    },
}

/// Stable classification of an [`Error`].
///
/// The string form is part of the public contract: the CLI prints it and
/// downstream collaborators match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input.
    Validation,
    /// Caregiver missing or not enabled.
    CaregiverNotEligible,
    /// State catalog misconfiguration.
    StateNotFound,
    /// Business-rule violation in the state machine.
    InvalidTransition,
    /// Missing resource.
    NotFound,
    /// Transient storage failure.
    Storage,
    /// Notification delivery failure.
    Notification,
    /// Configuration problem.
    Configuration,
    /// Filesystem problem.
    Io,
}

impl ErrorKind {
    /// Returns the stable string identifier of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::CaregiverNotEligible => "caregiver_not_eligible",
            Self::StateNotFound => "state_not_found",
            Self::InvalidTransition => "invalid_transition",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
            Self::Notification => "notification",
            Self::Configuration => "configuration",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<crate::reservation::ValidationError> for Error {
    fn from(err: crate::reservation::ValidationError) -> Self {
        Self::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl Error {
    /// Returns the stable kind of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use carebook::{Error, ErrorKind};
    ///
    /// let err = Error::StateNotFound { name: "Pending".into() };
    /// assert_eq!(err.kind(), ErrorKind::StateNotFound);
    /// assert_eq!(err.kind().as_str(), "state_not_found");
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::CaregiverNotEligible { .. } => ErrorKind::CaregiverNotEligible,
            Self::StateNotFound { .. } => ErrorKind::StateNotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage(_)
            | Self::TransitionStorage { .. }
            | Self::LockTimeout { .. }
            | Self::UnsupportedSchemaVersion { .. } => ErrorKind::Storage,
            Self::Notification { .. } => ErrorKind::Notification,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Only transient storage failures qualify. Transitions are safe to retry
    /// because their writes are conditioned on the observed status.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::TransitionStorage { .. } | Self::LockTimeout { .. }
        )
    }

    /// Check if error indicates a missing resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Maps busy/locked SQLite failures onto [`Error::LockTimeout`].
    pub(crate) fn from_storage(err: rusqlite::Error, busy_timeout_secs: u64) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
            if matches!(
                failure.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ) {
                return Self::LockTimeout {
                    seconds: busy_timeout_secs,
                };
            }
        }
        Self::Storage(err)
    }

    /// Reclassifies a busy/locked storage error as [`Error::LockTimeout`].
    #[must_use]
    pub(crate) fn with_lock_timeout(self, busy_timeout_secs: u64) -> Self {
        match self {
            Self::Storage(err) => Self::from_storage(err, busy_timeout_secs),
            other => other,
        }
    }

    /// Like [`Error::with_lock_timeout`], then ties any remaining storage
    /// failure to the reservation and transition that hit it.
    #[must_use]
    pub(crate) fn in_transition(
        self,
        reservation: ReservationId,
        transition: Transition,
        busy_timeout_secs: u64,
    ) -> Self {
        match self.with_lock_timeout(busy_timeout_secs) {
            Self::Storage(source) => Self::TransitionStorage {
                reservation,
                transition,
                source,
            },
            other => other,
        }
    }
}
