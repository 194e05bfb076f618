//! Reservation types for tracking caregiving engagements.
//!
//! This module provides the identifiers, the inclusive date range, the
//! money snapshot and the [`Reservation`] record itself, along with a builder
//! used by the storage layer to assemble reservations from rows.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::ReservationStatus;

/// Years whose instants keep the fixed-width RFC 3339 form the store sorts on.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
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

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a persisted reservation.
    ReservationId
);
id_type!(
    /// Identifier of a user in the identity store (client or caregiver).
    UserId
);
id_type!(
    /// Identifier of a pet.
    PetId
);

/// A currency amount in minor units (cents).
///
/// # Examples
///
/// ```
/// use carebook::Money;
///
/// let rate: Money = "20.0".parse().unwrap();
/// assert_eq!(rate.cents(), 2000);
/// assert_eq!(rate.times(3).to_string(), "60.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Multiplies the amount by a count, saturating on overflow.
    #[must_use]
    pub const fn times(self, count: u32) -> Self {
        Self(self.0.saturating_mul(count as i64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError {
            field: "amount".into(),
            message: format!("'{s}' is not a valid non-negative amount"),
        };

        let trimmed = s.trim();
        let (units, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if units.is_empty() || fraction.len() > 2 {
            return Err(invalid());
        }
        if !units.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = units.parse().map_err(|_| invalid())?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        units
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .map(Self)
            .ok_or_else(invalid)
    }
}

/// An inclusive range of calendar days.
///
/// Stored instants are UTC: the start is the first millisecond of the first
/// day, the end the last millisecond of the last day.
///
/// # Examples
///
/// ```
/// use carebook::DateRange;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
/// let range = DateRange::new(start, end).unwrap();
///
/// assert_eq!(range.day_count(), 3);
/// assert_eq!(range.starts_at().to_rfc3339(), "2024-03-01T00:00:00+00:00");
/// assert_eq!(range.ends_at().to_rfc3339(), "2024-03-03T23:59:59.999+00:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the start is after the end or either day
    /// falls outside the years 1 to 9999.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError {
                field: "date_range".into(),
                message: format!("start {start} is after end {end}"),
            });
        }
        for day in [start, end] {
            if !STORABLE_YEARS.contains(&day.year()) {
                return Err(ValidationError {
                    field: "date_range".into(),
                    message: format!("{day} is outside the years 1 to 9999"),
                });
            }
        }
        Ok(Self { start, end })
    }

    /// Rebuilds a range from stored instants.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the instants are inverted.
    pub fn from_instants(
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Self::new(starts_at.date_naive(), ends_at.date_naive())
    }

    /// First day of the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// UTC start of the first day.
    #[must_use]
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// UTC end of the last day (`23:59:59.999`).
    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
            - Duration::milliseconds(1)
    }

    /// Number of calendar days covered.
    #[must_use]
    pub fn day_count(&self) -> u32 {
        u32::try_from((self.end - self.start).num_days() + 1).unwrap_or(u32::MAX)
    }

    /// Whether `day` falls inside the range.
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Every day of the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take_while({
            let end = self.end;
            move |day| *day <= end
        })
    }

    /// Whether the last millisecond of the range is strictly before `now`.
    #[must_use]
    pub fn has_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.ends_at() < now
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A booked engagement between a client and a caregiver.
///
/// # Examples
///
/// ```
/// use carebook::{DateRange, Money, PetId, Reservation, ReservationId, ReservationStatus, UserId};
/// use chrono::NaiveDate;
///
/// let range = DateRange::new(
///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
/// ).unwrap();
///
/// let reservation = Reservation::builder(ReservationId::new(1), range, UserId::new(10), UserId::new(20))
///     .pets(vec![PetId::new(5)])
///     .rate_per_slot(Money::from_cents(2000))
///     .slot_count(3)
///     .build()
///     .unwrap();
///
/// assert_eq!(reservation.status(), ReservationStatus::Pending);
/// assert_eq!(reservation.total_price(), Money::from_cents(6000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    date_range: DateRange,
    client: UserId,
    caregiver: UserId,
    pets: Vec<PetId>,
    rate_per_slot: Money,
    slot_count: u32,
    comment: Option<String>,
    status: ReservationStatus,
    created_at: DateTime<Utc>,
}

impl Reservation {
    /// Creates a new reservation builder.
    #[must_use]
    pub fn builder(
        id: ReservationId,
        date_range: DateRange,
        client: UserId,
        caregiver: UserId,
    ) -> ReservationBuilder {
        ReservationBuilder {
            id,
            date_range,
            client,
            caregiver,
            pets: Vec::new(),
            rate_per_slot: Money::ZERO,
            slot_count: 0,
            comment: None,
            status: ReservationStatus::Pending,
            created_at: None,
        }
    }

    /// Returns the reservation identifier.
    #[must_use]
    pub const fn id(&self) -> ReservationId {
        self.id
    }

    /// Returns the reserved days.
    #[must_use]
    pub const fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    /// Returns the client.
    #[must_use]
    pub const fn client(&self) -> UserId {
        self.client
    }

    /// Returns the caregiver.
    #[must_use]
    pub const fn caregiver(&self) -> UserId {
        self.caregiver
    }

    /// Returns the pets covered by the reservation.
    #[must_use]
    pub fn pets(&self) -> &[PetId] {
        &self.pets
    }

    /// Returns the caregiver rate captured at creation time.
    #[must_use]
    pub const fn rate_per_slot(&self) -> Money {
        self.rate_per_slot
    }

    /// Returns the number of active slots.
    #[must_use]
    pub const fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Returns the optional comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> ReservationStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Price of the whole reservation: rate times active slots.
    #[must_use]
    pub const fn total_price(&self) -> Money {
        self.rate_per_slot.times(self.slot_count)
    }
}

/// Builder for creating `Reservation` instances.
#[derive(Debug)]
pub struct ReservationBuilder {
    id: ReservationId,
    date_range: DateRange,
    client: UserId,
    caregiver: UserId,
    pets: Vec<PetId>,
    rate_per_slot: Money,
    slot_count: u32,
    comment: Option<String>,
    status: ReservationStatus,
    created_at: Option<DateTime<Utc>>,
}

impl ReservationBuilder {
    /// Sets the pets.
    #[must_use]
    pub fn pets(mut self, pets: Vec<PetId>) -> Self {
        self.pets = pets;
        self
    }

    /// Sets the per-slot rate.
    #[must_use]
    pub const fn rate_per_slot(mut self, rate: Money) -> Self {
        self.rate_per_slot = rate;
        self
    }

    /// Sets the active slot count.
    #[must_use]
    pub const fn slot_count(mut self, slot_count: u32) -> Self {
        self.slot_count = slot_count;
        self
    }

    /// Sets the comment. Blank comments are dropped.
    #[must_use]
    pub fn comment(mut self, comment: Option<String>) -> Self {
        self.comment = normalize_comment(comment);
        self
    }

    /// Sets the status.
    #[must_use]
    pub const fn status(mut self, status: ReservationStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Builds the reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the pet set is empty.
    pub fn build(self) -> Result<Reservation, ValidationError> {
        if self.pets.is_empty() {
            return Err(ValidationError {
                field: "pets".into(),
                message: "at least one pet is required".into(),
            });
        }

        Ok(Reservation {
            id: self.id,
            date_range: self.date_range,
            client: self.client,
            caregiver: self.caregiver,
            pets: self.pets,
            rate_per_slot: self.rate_per_slot,
            slot_count: self.slot_count,
            comment: self.comment,
            status: self.status,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Trims a comment, turning blank input into `None`.
pub(crate) fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Error type for validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// A description of the validation failure.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod proptests;
