//! Per-day appointment slots.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::reservation::{ReservationId, ValidationError};

/// Identifier of a persisted slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(i64);

impl SlotId {
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

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A day chosen upstream together with the appointment hour.
///
/// # Examples
///
/// ```
/// use carebook::SlotRequest;
///
/// let request: SlotRequest = "2024-03-01@10".parse().unwrap();
/// assert_eq!(request.hour(), 10);
/// assert_eq!(request.starts_at().to_rfc3339(), "2024-03-01T10:00:00+00:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotRequest {
    date: NaiveDate,
    hour: u8,
}

impl SlotRequest {
    /// Creates a slot request.
    ///
    /// # Errors
    ///
    /// Returns an error if `hour` is not in `0..=23`.
    pub fn new(date: NaiveDate, hour: u8) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError {
                field: "hour".into(),
                message: format!("hour {hour} is outside 0..=23"),
            });
        }
        Ok(Self { date, hour })
    }

    /// The requested day.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The appointment hour.
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// UTC instant of the appointment, minutes and seconds zero.
    #[must_use]
    pub fn starts_at(&self) -> DateTime<Utc> {
        let time = NaiveTime::from_hms_opt(u32::from(self.hour), 0, 0).unwrap_or(NaiveTime::MIN);
        self.date.and_time(time).and_utc()
    }
}

impl FromStr for SlotRequest {
    type Err = ValidationError;

    /// Parses `YYYY-MM-DD@HH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ValidationError {
            field: "slot".into(),
            message,
        };

        let (date, hour) = s
            .trim()
            .split_once('@')
            .ok_or_else(|| invalid(format!("'{s}' is not in YYYY-MM-DD@HH form")))?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| invalid(format!("invalid date '{date}': {e}")))?;
        let hour = hour
            .parse::<u8>()
            .map_err(|e| invalid(format!("invalid hour '{hour}': {e}")))?;

        Self::new(date, hour)
    }
}

/// A persisted appointment slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Slot identifier.
    pub id: SlotId,
    /// Appointment instant (UTC).
    pub starts_at: DateTime<Utc>,
    /// Owning reservation.
    pub reservation: ReservationId,
    /// Soft-delete flag, set when the reservation left the live statuses.
    pub deleted: bool,
}

impl Slot {
    /// Appointment hour of the slot.
    #[must_use]
    pub fn hour(&self) -> u8 {
        u8::try_from(self.starts_at.hour()).unwrap_or_default()
    }
}
