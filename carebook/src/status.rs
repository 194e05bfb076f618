//! Reservation statuses and the transition table.
//!
//! The lifecycle is a small finite state machine:
//!
//! ```text
//! Pending  -> Approved | Rejected | Cancelled
//! Approved -> Completed | Cancelled | Annulled
//! Rejected, Cancelled, Annulled, Completed: terminal
//! ```
//!
//! Statuses are compared by value. The persisted identifiers live in the
//! state catalog and are resolved by [`ReservationStatus::name`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status of a reservation.
///
/// # Examples
///
/// ```
/// use carebook::ReservationStatus;
///
/// assert_eq!(ReservationStatus::Pending.name(), "Pending");
/// assert!(ReservationStatus::Completed.is_terminal());
/// assert!(ReservationStatus::Approved.is_live());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// Created, awaiting the caregiver's decision.
    Pending,
    /// Accepted by the caregiver.
    Approved,
    /// Declined by the caregiver.
    Rejected,
    /// Withdrawn before or after approval.
    Cancelled,
    /// Voided after approval.
    Annulled,
    /// The date range elapsed while approved.
    Completed,
}

impl ReservationStatus {
    /// Every status, in catalog seeding order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Cancelled,
        Self::Annulled,
        Self::Completed,
    ];

    /// Statuses that commit the caregiver's time.
    pub const LIVE: [Self; 2] = [Self::Pending, Self::Approved];

    /// Returns the catalog name of this status.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
            Self::Annulled => "Annulled",
            Self::Completed => "Completed",
        }
    }

    /// Whether no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Cancelled | Self::Annulled | Self::Completed
        )
    }

    /// Whether the reservation still occupies the caregiver's agenda.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown reservation status: {s}"))
    }
}

/// A lifecycle operation on an existing reservation.
///
/// # Examples
///
/// ```
/// use carebook::{ReservationStatus, Transition};
///
/// assert!(Transition::Cancel.allowed_from(ReservationStatus::Approved));
/// assert!(!Transition::Annul.allowed_from(ReservationStatus::Pending));
/// assert_eq!(Transition::Reject.target(), Some(ReservationStatus::Rejected));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Pending to Approved.
    Approve,
    /// Pending to Rejected.
    Reject,
    /// Pending or Approved to Cancelled.
    Cancel,
    /// Approved to Annulled.
    Annul,
    /// Approved to Completed, once the date range has elapsed.
    Complete,
    /// Physical removal of a pending reservation.
    Delete,
}

impl Transition {
    /// Returns the operation name used in messages and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::Annul => "annul",
            Self::Complete => "complete",
            Self::Delete => "delete",
        }
    }

    /// Statuses this transition may start from.
    #[must_use]
    pub const fn sources(self) -> &'static [ReservationStatus] {
        use ReservationStatus::{Approved, Pending};
        match self {
            Self::Approve | Self::Reject | Self::Delete => &[Pending],
            Self::Cancel => &[Pending, Approved],
            Self::Annul | Self::Complete => &[Approved],
        }
    }

    /// Whether this transition is legal from `current`.
    #[must_use]
    pub fn allowed_from(self, current: ReservationStatus) -> bool {
        self.sources().contains(&current)
    }

    /// The status the reservation ends in, or `None` for a hard delete.
    #[must_use]
    pub const fn target(self) -> Option<ReservationStatus> {
        match self {
            Self::Approve => Some(ReservationStatus::Approved),
            Self::Reject => Some(ReservationStatus::Rejected),
            Self::Cancel => Some(ReservationStatus::Cancelled),
            Self::Annul => Some(ReservationStatus::Annulled),
            Self::Complete => Some(ReservationStatus::Completed),
            Self::Delete => None,
        }
    }

    /// Whether the reservation's slots are soft-deleted as part of the move.
    #[must_use]
    pub const fn releases_slots(self) -> bool {
        matches!(self, Self::Reject | Self::Cancel | Self::Annul)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
