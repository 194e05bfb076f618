//! Reservation creation.

use chrono::{NaiveDate, Utc};
use rusqlite::TransactionBehavior;

use crate::database::{Database, NewReservation};
use crate::error::{Error, Result};
use crate::reservation::{normalize_comment, DateRange, PetId, Reservation, UserId, ValidationError};
use crate::slot::SlotRequest;
use crate::status::ReservationStatus;

use super::{not_found, ReservationEngine};

/// Options for creating a reservation.
///
/// # Examples
///
/// ```
/// use carebook::engine::CreateOptions;
/// use carebook::{PetId, SlotRequest, UserId};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
/// let options = CreateOptions::new(UserId::new(10), UserId::new(20), start, end)
///     .with_pets(vec![PetId::new(1)])
///     .with_slots(vec![
///         SlotRequest::new(start, 9).unwrap(),
///         SlotRequest::new(end, 9).unwrap(),
///     ])
///     .with_comment(Some("keys under the mat".into()));
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// The booking client.
    pub client: UserId,
    /// The caregiver being booked.
    pub caregiver: UserId,
    /// First reserved day.
    pub start: NaiveDate,
    /// Last reserved day.
    pub end: NaiveDate,
    /// Pets covered by the reservation.
    pub pets: Vec<PetId>,
    /// One entry per reserved day.
    pub slots: Vec<SlotRequest>,
    /// Optional free-text comment.
    pub comment: Option<String>,
}

/// Creation input after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCreate {
    /// Reserved days.
    pub date_range: DateRange,
    /// Pets, duplicates removed, first occurrence kept.
    pub pets: Vec<PetId>,
    /// Slots in chronological order.
    pub slots: Vec<SlotRequest>,
    /// Trimmed comment, `None` if blank.
    pub comment: Option<String>,
}

impl CreateOptions {
    /// Creates options with no pets, slots or comment.
    #[must_use]
    pub const fn new(client: UserId, caregiver: UserId, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            client,
            caregiver,
            start,
            end,
            pets: Vec::new(),
            slots: Vec::new(),
            comment: None,
        }
    }

    /// Sets the pets.
    #[must_use]
    pub fn with_pets(mut self, pets: Vec<PetId>) -> Self {
        self.pets = pets;
        self
    }

    /// Sets the slots.
    #[must_use]
    pub fn with_slots(mut self, slots: Vec<SlotRequest>) -> Self {
        self.slots = slots;
        self
    }

    /// Books every day of the range at the same hour.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is inverted or the hour is invalid.
    pub fn with_daily_slots(mut self, hour: u8) -> std::result::Result<Self, ValidationError> {
        let range = DateRange::new(self.start, self.end)?;
        self.slots = range
            .days()
            .map(|day| SlotRequest::new(day, hour))
            .collect::<std::result::Result<_, _>>()?;
        Ok(self)
    }

    /// Sets the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// Checks the input without touching storage.
    ///
    /// # Errors
    ///
    /// Returns a validation error if:
    /// - The pet set is empty
    /// - The slot list is empty
    /// - `start > end`
    /// - A slot falls outside the range
    /// - Two slots share a date
    pub fn validate(&self) -> std::result::Result<ValidatedCreate, ValidationError> {
        if self.pets.is_empty() {
            return Err(ValidationError {
                field: "pets".into(),
                message: "at least one pet is required".into(),
            });
        }
        if self.slots.is_empty() {
            return Err(ValidationError {
                field: "slots".into(),
                message: "at least one day is required".into(),
            });
        }

        let date_range = DateRange::new(self.start, self.end)?;

        let mut slots = self.slots.clone();
        slots.sort();
        for slot in &slots {
            if !date_range.contains(slot.date()) {
                return Err(ValidationError {
                    field: "slots".into(),
                    message: format!("{} is outside {date_range}", slot.date()),
                });
            }
        }
        if let Some(pair) = slots.windows(2).find(|w| w[0].date() == w[1].date()) {
            return Err(ValidationError {
                field: "slots".into(),
                message: format!("{} is requested more than once", pair[0].date()),
            });
        }

        let mut pets = Vec::with_capacity(self.pets.len());
        for pet in &self.pets {
            if !pets.contains(pet) {
                pets.push(*pet);
            }
        }

        Ok(ValidatedCreate {
            date_range,
            pets,
            slots,
            comment: normalize_comment(self.comment.clone()),
        })
    }
}

impl ReservationEngine {
    /// Creates a pending reservation and its slots in one transaction.
    ///
    /// The caregiver's current hourly rate is captured as the reservation's
    /// per-slot rate. No notification is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Validation fails (see [`CreateOptions::validate`])
    /// - The caregiver is unknown or not enabled
    /// - The catalog has no `Pending` state
    /// - Any write fails, in which case nothing is persisted
    pub fn create(&mut self, options: CreateOptions) -> Result<Reservation> {
        let busy = self.db.busy_timeout_secs();
        self.create_inner(&options)
            .map_err(|e| e.with_lock_timeout(busy))
    }

    fn create_inner(&mut self, options: &CreateOptions) -> Result<Reservation> {
        let validated = options.validate()?;

        let caregiver = self
            .directory
            .find_caregiver(options.caregiver)?
            .filter(|profile| profile.enabled)
            .ok_or(Error::CaregiverNotEligible {
                caregiver: options.caregiver.value(),
            })?;

        let pending = self
            .catalog
            .resolve(self.db.connection(), ReservationStatus::Pending)?;

        let tx = self
            .db
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let id = Database::insert_reservation(
            &tx,
            &NewReservation {
                date_range: &validated.date_range,
                client: options.client,
                caregiver: options.caregiver,
                rate_per_slot: caregiver.hourly_rate,
                comment: validated.comment.as_deref(),
                state: pending,
                created_at: Utc::now(),
            },
        )?;
        Database::insert_reservation_pets(&tx, id, &validated.pets)?;
        for slot in &validated.slots {
            Database::insert_slot(&tx, id, slot.starts_at())?;
            Database::increment_slot_count(&tx, id)?;
        }

        // Read back before commit so a row that does not load is never kept
        let created = Database::get_reservation(&tx, id)?.ok_or_else(|| not_found(id))?;
        tx.commit()?;

        log::info!(
            "created reservation {id} for caregiver {} over {} ({} slots)",
            options.caregiver,
            validated.date_range,
            validated.slots.len()
        );
        Ok(created)
    }
}
