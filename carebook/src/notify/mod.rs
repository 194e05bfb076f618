//! Status-change notifications.
//!
//! After every committed status change the engine hands a
//! [`StatusChangeEvent`] to a [`NotificationDispatcher`], which forwards it
//! to a [`NotificationSink`]. Delivery is best-effort: failures are logged and
//! counted, never reported back to the caller of the transition.

mod dispatcher;
mod sinks;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reservation::{Reservation, ReservationId, UserId};
use crate::status::ReservationStatus;

pub use dispatcher::{DeliveryStats, DispatchMode, NotificationDispatcher};
pub use sinks::{JsonLinesSink, LogSink, RecordingSink};

/// A committed status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeEvent {
    /// The reservation that changed.
    pub reservation: ReservationId,
    /// Status before the change.
    pub previous: ReservationStatus,
    /// Status after the change.
    pub status: ReservationStatus,
    /// The booking client.
    pub client: UserId,
    /// The booked caregiver.
    pub caregiver: UserId,
    /// Commit time.
    pub occurred_at: DateTime<Utc>,
}

impl StatusChangeEvent {
    /// Builds the event for a reservation already in its new status.
    #[must_use]
    pub fn new(
        reservation: &Reservation,
        previous: ReservationStatus,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            reservation: reservation.id(),
            previous,
            status: reservation.status(),
            client: reservation.client(),
            caregiver: reservation.caregiver(),
            occurred_at,
        }
    }
}

/// Receiver of status-change events.
///
/// Implementations must be shareable across threads; the dispatcher may call
/// them from a worker thread.
pub trait NotificationSink: Send + Sync {
    /// Delivers one event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Notification`] (or any other error) when the
    /// event could not be delivered. The dispatcher logs it and moves on.
    fn deliver(&self, event: &StatusChangeEvent) -> Result<()>;

    /// Short name used in log lines.
    fn name(&self) -> &'static str {
        "sink"
    }
}
