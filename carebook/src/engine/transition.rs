//! Status transitions.

use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;

use crate::catalog::StateId;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::notify::StatusChangeEvent;
use crate::reservation::{Reservation, ReservationId};
use crate::status::{ReservationStatus, Transition};

use super::{not_found, ReservationEngine};

impl ReservationEngine {
    /// Pending to Approved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the reservation is
    /// pending, [`Error::NotFound`] if it does not exist.
    pub fn approve(&mut self, id: ReservationId) -> Result<Reservation> {
        self.apply(id, Transition::Approve, Utc::now())
    }

    /// Pending to Rejected; releases the slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the reservation is
    /// pending, [`Error::NotFound`] if it does not exist.
    pub fn reject(&mut self, id: ReservationId) -> Result<Reservation> {
        self.apply(id, Transition::Reject, Utc::now())
    }

    /// Pending or Approved to Cancelled; releases the slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the reservation is
    /// pending or approved, [`Error::NotFound`] if it does not exist.
    pub fn cancel(&mut self, id: ReservationId) -> Result<Reservation> {
        self.apply(id, Transition::Cancel, Utc::now())
    }

    /// Approved to Annulled; releases the slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the reservation is
    /// approved, [`Error::NotFound`] if it does not exist.
    pub fn annul(&mut self, id: ReservationId) -> Result<Reservation> {
        self.apply(id, Transition::Annul, Utc::now())
    }

    /// Approved to Completed once the range has elapsed at `now`.
    ///
    /// Only the reconciliation sweep drives this transition.
    pub(crate) fn complete(
        &mut self,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<Reservation> {
        self.apply(id, Transition::Complete, now)
    }

    /// Approved reservations whose range ended before `now`.
    pub(crate) fn elapsed_approved(&mut self, now: DateTime<Utc>) -> Result<Vec<Reservation>> {
        let approved = self
            .catalog
            .resolve(self.db.connection(), ReservationStatus::Approved)?;
        Database::find_elapsed_reservations(self.db.connection(), approved, now)
    }

    /// Physically removes a pending reservation and its slots.
    ///
    /// No notification is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the reservation is
    /// pending, [`Error::NotFound`] if it does not exist.
    pub fn delete(&mut self, id: ReservationId) -> Result<()> {
        let busy = self.db.busy_timeout_secs();
        self.delete_inner(id)
            .map_err(|e| e.in_transition(id, Transition::Delete, busy))
    }

    fn delete_inner(&mut self, id: ReservationId) -> Result<()> {
        let current = self.get(id)?;
        check_allowed(&current, Transition::Delete)?;

        for reload in [false, true] {
            let expected = self.state_id(current.status(), reload)?;
            let tx = self
                .db
                .connection_mut()
                .transaction_with_behavior(TransactionBehavior::Immediate)?;
            if Database::delete_reservation_if_state(&tx, id, expected)? {
                tx.commit()?;
                log::info!("deleted pending reservation {id}");
                return Ok(());
            }
            drop(tx);

            self.explain_conflict(id, Transition::Delete, current.status())?;
        }

        Err(stale_catalog(id, Transition::Delete, current.status()))
    }

    fn apply(
        &mut self,
        id: ReservationId,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Reservation> {
        let busy = self.db.busy_timeout_secs();
        self.apply_inner(id, transition, now)
            .map_err(|e| e.in_transition(id, transition, busy))
    }

    fn apply_inner(
        &mut self,
        id: ReservationId,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Reservation> {
        let current = self.get(id)?;
        check_allowed(&current, transition)?;

        let Some(target) = transition.target() else {
            return Err(Error::Validation {
                field: "transition".into(),
                message: format!("{transition} does not lead to a status"),
            });
        };

        if transition == Transition::Complete && !current.date_range().has_elapsed(now) {
            return Err(Error::Validation {
                field: "date_range".into(),
                message: format!(
                    "reservation {id} ends at {} which is not before {now}",
                    current.date_range().ends_at()
                ),
            });
        }

        for reload in [false, true] {
            let expected = self.state_id(current.status(), reload)?;
            let to = self.state_id(target, false)?;

            if self.write_transition(id, transition, expected, to)? {
                let updated = self.get(id)?;
                log::info!(
                    "reservation {id}: {} -> {} ({transition})",
                    current.status(),
                    updated.status()
                );
                self.notifier.dispatch(StatusChangeEvent::new(
                    &updated,
                    current.status(),
                    Utc::now(),
                ));
                return Ok(updated);
            }

            self.explain_conflict(id, transition, current.status())?;
        }

        Err(stale_catalog(id, transition, current.status()))
    }

    /// One transaction: conditional state write, then slot release.
    ///
    /// Returns `false` if the row no longer holds `expected`.
    fn write_transition(
        &mut self,
        id: ReservationId,
        transition: Transition,
        expected: StateId,
        to: StateId,
    ) -> Result<bool> {
        let tx = self
            .db
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !Database::compare_and_set_state(&tx, id, expected, to)? {
            return Ok(false);
        }

        if transition.releases_slots() {
            let released = Database::soft_delete_slots(&tx, id)?;
            Database::recompute_slot_count(&tx, id)?;
            log::debug!("released {released} slots of reservation {id}");
        }

        tx.commit()?;
        Ok(true)
    }

    /// Works out why a compare-and-swap matched no row.
    ///
    /// Returns `Ok(())` when the stored status still equals `observed`: the
    /// cached state identifiers are stale and a retry after a catalog reload
    /// may succeed. A status that moved, or a row that vanished, is an error.
    fn explain_conflict(
        &self,
        id: ReservationId,
        transition: Transition,
        observed: ReservationStatus,
    ) -> Result<()> {
        let fresh = Database::get_reservation(self.db.connection(), id)?
            .ok_or_else(|| not_found(id))?;

        if fresh.status() == observed {
            log::debug!("state identifiers for reservation {id} look stale, reloading catalog");
            return Ok(());
        }

        log::info!(
            "{transition} of reservation {id} lost a race: now {}",
            fresh.status()
        );
        Err(Error::InvalidTransition {
            reservation: id,
            transition,
            current: fresh.status(),
        })
    }

    fn state_id(&mut self, status: ReservationStatus, reload: bool) -> Result<StateId> {
        if reload {
            self.catalog.refresh(self.db.connection())?;
        }
        self.catalog.resolve(self.db.connection(), status)
    }
}

fn stale_catalog(id: ReservationId, transition: Transition, current: ReservationStatus) -> Error {
    log::warn!("{transition} of reservation {id} failed twice against the state catalog");
    Error::InvalidTransition {
        reservation: id,
        transition,
        current,
    }
}

fn check_allowed(reservation: &Reservation, transition: Transition) -> Result<()> {
    if transition.allowed_from(reservation.status()) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            reservation: reservation.id(),
            transition,
            current: reservation.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;
    use crate::database::test_util::day;
    use crate::engine::test_util::{booking, seeded_engine};
    use crate::error::ErrorKind;
    use crate::notify::RecordingSink;

    fn setup() -> (ReservationEngine, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        (seeded_engine(Arc::clone(&sink)), sink)
    }

    fn pending(engine: &mut ReservationEngine) -> ReservationId {
        engine
            .create(booking(day(2024, 3, 1), day(2024, 3, 3)))
            .unwrap()
            .id()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_approve_moves_pending_and_notifies() {
        let (mut engine, sink) = setup();
        let id = pending(&mut engine);

        let approved = engine.approve(id).unwrap();
        assert_eq!(approved.status(), ReservationStatus::Approved);
        assert_eq!(approved.slot_count(), 3);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reservation, id);
        assert_eq!(events[0].previous, ReservationStatus::Pending);
        assert_eq!(events[0].status, ReservationStatus::Approved);
    }

    #[test]
    fn test_approve_twice_fails_without_second_event() {
        let (mut engine, sink) = setup();
        let id = pending(&mut engine);
        engine.approve(id).unwrap();

        let err = engine.approve(id).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                transition: Transition::Approve,
                current: ReservationStatus::Approved,
                ..
            }
        ));
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_reject_releases_slots() {
        let (mut engine, _sink) = setup();
        let id = pending(&mut engine);

        let rejected = engine.reject(id).unwrap();
        assert_eq!(rejected.status(), ReservationStatus::Rejected);
        assert_eq!(rejected.slot_count(), 0);
        assert_eq!(rejected.total_price().cents(), 0);

        let slots = engine.slots_for(id).unwrap();
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|s| s.deleted));
    }

    #[test]
    fn test_cancel_from_pending_and_approved() {
        let (mut engine, _sink) = setup();
        let first = pending(&mut engine);
        let second = pending(&mut engine);
        engine.approve(second).unwrap();

        assert_eq!(
            engine.cancel(first).unwrap().status(),
            ReservationStatus::Cancelled
        );
        let cancelled = engine.cancel(second).unwrap();
        assert_eq!(cancelled.status(), ReservationStatus::Cancelled);
        assert_eq!(cancelled.slot_count(), 0);
    }

    #[test]
    fn test_annul_requires_approved() {
        let (mut engine, _sink) = setup();
        let id = pending(&mut engine);

        let err = engine.annul(id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(engine.get(id).unwrap().status(), ReservationStatus::Pending);
        assert_eq!(engine.get(id).unwrap().slot_count(), 3);

        engine.approve(id).unwrap();
        let annulled = engine.annul(id).unwrap();
        assert_eq!(annulled.status(), ReservationStatus::Annulled);
        assert_eq!(annulled.slot_count(), 0);
    }

    #[test]
    fn test_terminal_states_refuse_everything() {
        let (mut engine, sink) = setup();
        let id = pending(&mut engine);
        engine.reject(id).unwrap();

        assert!(engine.approve(id).is_err());
        assert!(engine.reject(id).is_err());
        assert!(engine.cancel(id).is_err());
        assert!(engine.annul(id).is_err());
        assert!(engine.delete(id).is_err());
        assert!(engine.complete(id, utc(2030, 1, 1, 0)).is_err());
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_unknown_reservation_not_found() {
        let (mut engine, _sink) = setup();
        let err = engine.approve(ReservationId::new(999)).unwrap_err();
        assert!(err.is_not_found());
        assert!(engine.delete(ReservationId::new(999)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_complete_requires_elapsed_range() {
        let (mut engine, sink) = setup();
        let id = pending(&mut engine);
        engine.approve(id).unwrap();

        let err = engine.complete(id, utc(2024, 3, 3, 12)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(engine.get(id).unwrap().status(), ReservationStatus::Approved);

        let completed = engine.complete(id, utc(2024, 3, 4, 0)).unwrap();
        assert_eq!(completed.status(), ReservationStatus::Completed);
        assert_eq!(completed.slot_count(), 3);
        assert_eq!(sink.events().last().unwrap().status, ReservationStatus::Completed);
    }

    #[test]
    fn test_delete_pending_removes_row_and_slots() {
        let (mut engine, sink) = setup();
        let id = pending(&mut engine);

        engine.delete(id).unwrap();
        assert!(engine.get(id).unwrap_err().is_not_found());
        assert!(Database::list_slots(engine.database().connection(), id)
            .unwrap()
            .is_empty());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_delete_approved_refused() {
        let (mut engine, _sink) = setup();
        let id = pending(&mut engine);
        engine.approve(id).unwrap();

        let err = engine.delete(id).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                transition: Transition::Delete,
                ..
            }
        ));
        assert!(engine.get(id).is_ok());
    }

    #[test]
    fn test_failing_sink_does_not_fail_transition() {
        let sink = Arc::new(RecordingSink::failing());
        let mut engine = seeded_engine(Arc::clone(&sink));
        let id = pending(&mut engine);

        let approved = engine.approve(id).unwrap();
        assert_eq!(approved.status(), ReservationStatus::Approved);
        assert_eq!(engine.notifier().stats().failed(), 1);
        assert_eq!(engine.notifier().stats().delivered(), 0);
    }

    #[test]
    fn test_stale_state_identifiers_are_reloaded() {
        let (mut engine, _sink) = setup();
        let id = pending(&mut engine);

        // Replace every catalog entry with a new identifier behind the
        // engine's back; its cache still holds the old ones.
        engine
            .database()
            .connection()
            .execute_batch(
                "UPDATE states SET name = name || ' (retired)';
                 INSERT INTO states (name) VALUES
                     ('Pending'), ('Approved'), ('Rejected'),
                     ('Cancelled'), ('Annulled'), ('Completed');
                 UPDATE reservations SET state_id = (
                     SELECT fresh.id FROM states fresh
                     JOIN states old ON fresh.name || ' (retired)' = old.name
                     WHERE old.id = reservations.state_id
                 );",
            )
            .unwrap();

        let approved = engine.approve(id).unwrap();
        assert_eq!(approved.status(), ReservationStatus::Approved);
    }

    #[test]
    fn test_elapsed_approved_filters_by_status_and_end() {
        let (mut engine, _sink) = setup();
        let ended = pending(&mut engine);
        engine.approve(ended).unwrap();
        let still_pending = pending(&mut engine);
        let running = engine
            .create(booking(day(2024, 3, 2), day(2024, 3, 6)))
            .unwrap()
            .id();
        engine.approve(running).unwrap();

        let elapsed = engine.elapsed_approved(utc(2024, 3, 5, 0)).unwrap();
        let ids: Vec<_> = elapsed.iter().map(Reservation::id).collect();
        assert_eq!(ids, vec![ended]);
        assert!(!ids.contains(&still_pending));
    }
}
