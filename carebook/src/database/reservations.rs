//! Reservation persistence.
//!
//! Every function here takes a `&Connection` so it can run inside a
//! transaction opened by the engine. None of them enforce the lifecycle
//! rules; state-guarded writes are expressed as compare-and-swap statements
//! and report whether a row matched.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::catalog::StateId;
use crate::error::Result;
use crate::reservation::{DateRange, Money, PetId, Reservation, ReservationId, UserId};
use crate::status::ReservationStatus;

use super::connection::Database;

/// Formats an instant the way every timestamp column stores it.
pub(super) fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored instant, reporting failures against column `idx`.
pub(super) fn parse_instant(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

const SELECT_COLUMNS: &str = r"
    SELECT r.id, r.start_at, r.end_at, r.client_id, r.caregiver_id, r.rate_cents,
           r.slot_count, r.comment, s.name, r.created_at,
           (SELECT group_concat(p.pet_id) FROM reservation_pets p WHERE p.reservation_id = r.id)
    FROM reservations r
    JOIN states s ON s.id = r.state_id
";

const INSERT_RESERVATION: &str = r"
    INSERT INTO reservations
    (start_at, end_at, client_id, caregiver_id, rate_cents, slot_count, comment, state_id, created_at)
    VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?)
";

const INSERT_PET: &str =
    "INSERT OR IGNORE INTO reservation_pets (reservation_id, pet_id) VALUES (?, ?)";

const INCREMENT_SLOT_COUNT: &str =
    "UPDATE reservations SET slot_count = slot_count + 1 WHERE id = ?";

const RECOMPUTE_SLOT_COUNT: &str = r"
    UPDATE reservations
    SET slot_count = (SELECT COUNT(*) FROM slots WHERE reservation_id = ?1 AND deleted = 0)
    WHERE id = ?1
";

const COMPARE_AND_SET_STATE: &str =
    "UPDATE reservations SET state_id = ? WHERE id = ? AND state_id = ?";

const DELETE_IF_STATE: &str = "DELETE FROM reservations WHERE id = ? AND state_id = ?";

const WHERE_ID: &str = "WHERE r.id = ?";

const WHERE_CLIENT: &str = "WHERE r.client_id = ? ORDER BY r.start_at, r.id";

const WHERE_CAREGIVER: &str = "WHERE r.caregiver_id = ? ORDER BY r.start_at, r.id";

const ORDER_ALL: &str = "ORDER BY r.id";

// Intervals intersect when each starts before the other ends.
const WHERE_OVERLAPPING: &str = r"
    WHERE r.caregiver_id = ? AND r.start_at <= ? AND r.end_at >= ? AND r.state_id IN (?, ?)
    ORDER BY r.start_at, r.id
";

const WHERE_ELAPSED: &str = "WHERE r.state_id = ? AND r.end_at < ? ORDER BY r.end_at, r.id";

/// Values written when a reservation is first inserted.
#[derive(Debug, Clone)]
pub struct NewReservation<'a> {
    /// Reserved days.
    pub date_range: &'a DateRange,
    /// Booking client.
    pub client: UserId,
    /// Booked caregiver.
    pub caregiver: UserId,
    /// Caregiver rate at creation time.
    pub rate_per_slot: Money,
    /// Optional free-text comment.
    pub comment: Option<&'a str>,
    /// Initial state.
    pub state: StateId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Deserializes a reservation row produced by `SELECT_COLUMNS`.
fn row_to_reservation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reservation> {
    let id: i64 = row.get(0)?;
    let start_at: String = row.get(1)?;
    let end_at: String = row.get(2)?;
    let client: i64 = row.get(3)?;
    let caregiver: i64 = row.get(4)?;
    let rate_cents: i64 = row.get(5)?;
    let slot_count: u32 = row.get(6)?;
    let comment: Option<String> = row.get(7)?;
    let state_name: String = row.get(8)?;
    let created_at: String = row.get(9)?;
    let pets: Option<String> = row.get(10)?;

    let date_range =
        DateRange::from_instants(parse_instant(1, &start_at)?, parse_instant(2, &end_at)?)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    let status: ReservationStatus = state_name
        .parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, e.into()))?;

    let pets = pets
        .unwrap_or_default()
        .split(',')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<i64>().map(PetId::new))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    Reservation::builder(
        ReservationId::new(id),
        date_range,
        UserId::new(client),
        UserId::new(caregiver),
    )
    .pets(pets)
    .rate_per_slot(Money::from_cents(rate_cents))
    .slot_count(slot_count)
    .comment(comment)
    .status(status)
    .created_at(parse_instant(9, &created_at)?)
    .build()
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))
}

impl Database {
    /// Inserts a reservation row with `slot_count = 0`.
    ///
    /// Pets and slots are written separately so the caller can keep all of
    /// it in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_reservation(conn: &Connection, new: &NewReservation<'_>) -> Result<ReservationId> {
        conn.execute(
            INSERT_RESERVATION,
            params![
                format_instant(new.date_range.starts_at()),
                format_instant(new.date_range.ends_at()),
                new.client.value(),
                new.caregiver.value(),
                new.rate_per_slot.cents(),
                new.comment,
                new.state.value(),
                format_instant(new.created_at),
            ],
        )?;
        Ok(ReservationId::new(conn.last_insert_rowid()))
    }

    /// Links pets to a reservation. Duplicates are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails.
    pub fn insert_reservation_pets(
        conn: &Connection,
        reservation: ReservationId,
        pets: &[PetId],
    ) -> Result<()> {
        let mut stmt = conn.prepare(INSERT_PET)?;
        for pet in pets {
            stmt.execute(params![reservation.value(), pet.value()])?;
        }
        Ok(())
    }

    /// Adds one to a reservation's slot count.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn increment_slot_count(conn: &Connection, reservation: ReservationId) -> Result<()> {
        conn.execute(INCREMENT_SLOT_COUNT, [reservation.value()])?;
        Ok(())
    }

    /// Sets a reservation's slot count to its number of non-deleted slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn recompute_slot_count(conn: &Connection, reservation: ReservationId) -> Result<()> {
        conn.execute(RECOMPUTE_SLOT_COUNT, [reservation.value()])?;
        Ok(())
    }

    /// Moves a reservation to `to` only if it is still in `expected`.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the row was updated
    /// - `Ok(false)` if the row is missing or its state changed meanwhile
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn compare_and_set_state(
        conn: &Connection,
        reservation: ReservationId,
        expected: StateId,
        to: StateId,
    ) -> Result<bool> {
        let rows = conn.execute(
            COMPARE_AND_SET_STATE,
            params![to.value(), reservation.value(), expected.value()],
        )?;
        Ok(rows > 0)
    }

    /// Deletes a reservation only if it is still in `expected`.
    ///
    /// Pets and slots go with it through the foreign key cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_reservation_if_state(
        conn: &Connection,
        reservation: ReservationId,
        expected: StateId,
    ) -> Result<bool> {
        let rows = conn.execute(DELETE_IF_STATE, params![reservation.value(), expected.value()])?;
        Ok(rows > 0)
    }

    /// Retrieves a reservation.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(reservation))` if the reservation exists
    /// - `Ok(None)` if it doesn't
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed.
    pub fn get_reservation(conn: &Connection, id: ReservationId) -> Result<Option<Reservation>> {
        let sql = format!("{SELECT_COLUMNS} {WHERE_ID}");
        Ok(conn
            .query_row(&sql, [id.value()], row_to_reservation)
            .optional()?)
    }

    /// Lists every reservation booked by a client, earliest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_reservations_for_client(
        conn: &Connection,
        client: UserId,
    ) -> Result<Vec<Reservation>> {
        Self::query_reservations(conn, WHERE_CLIENT, params![client.value()])
    }

    /// Lists every reservation booked with a caregiver, earliest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_reservations_for_caregiver(
        conn: &Connection,
        caregiver: UserId,
    ) -> Result<Vec<Reservation>> {
        Self::query_reservations(conn, WHERE_CAREGIVER, params![caregiver.value()])
    }

    /// Lists every reservation in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all_reservations(conn: &Connection) -> Result<Vec<Reservation>> {
        Self::query_reservations(conn, ORDER_ALL, params![])
    }

    /// Finds a caregiver's reservations intersecting `[from, to]` whose
    /// state is one of `states`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_overlapping_reservations(
        conn: &Connection,
        caregiver: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        states: [StateId; 2],
    ) -> Result<Vec<Reservation>> {
        Self::query_reservations(
            conn,
            WHERE_OVERLAPPING,
            params![
                caregiver.value(),
                format_instant(to),
                format_instant(from),
                states[0].value(),
                states[1].value(),
            ],
        )
    }

    /// Finds reservations in `state` whose range ended strictly before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_elapsed_reservations(
        conn: &Connection,
        state: StateId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reservation>> {
        Self::query_reservations(
            conn,
            WHERE_ELAPSED,
            params![state.value(), format_instant(now)],
        )
    }

    fn query_reservations(
        conn: &Connection,
        clause: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Reservation>> {
        let sql = format!("{SELECT_COLUMNS} {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let reservations = stmt
            .query_map(params, row_to_reservation)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reservations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util::{create_test_database, day};

    fn new_reservation<'a>(range: &'a DateRange, state: StateId) -> NewReservation<'a> {
        NewReservation {
            date_range: range,
            client: UserId::new(1),
            caregiver: UserId::new(2),
            rate_per_slot: Money::from_cents(2000),
            comment: Some("two walks"),
            state,
            created_at: Utc::now(),
        }
    }

    fn state(db: &Database, name: &str) -> StateId {
        Database::load_states(db.connection())
            .unwrap()
            .into_iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| id)
            .unwrap()
    }

    #[test]
    fn test_instant_format_is_sortable() {
        let early = day(2024, 3, 1).and_hms_opt(9, 0, 0).unwrap().and_utc();
        let late = day(2024, 3, 1).and_hms_opt(10, 0, 0).unwrap().and_utc();
        assert_eq!(format_instant(early), "2024-03-01T09:00:00.000Z");
        assert!(format_instant(early) < format_instant(late));
        assert_eq!(parse_instant(0, &format_instant(late)).unwrap(), late);
    }

    #[test]
    fn test_insert_and_get_reservation() {
        let mut db = create_test_database();
        db.seed_states().unwrap();
        let pending = state(&db, "Pending");
        let range = DateRange::new(day(2024, 3, 1), day(2024, 3, 3)).unwrap();

        let conn = db.connection();
        let id = Database::insert_reservation(conn, &new_reservation(&range, pending)).unwrap();
        Database::insert_reservation_pets(conn, id, &[PetId::new(5), PetId::new(6), PetId::new(5)])
            .unwrap();

        let reservation = Database::get_reservation(conn, id).unwrap().unwrap();
        assert_eq!(reservation.id(), id);
        assert_eq!(reservation.date_range(), &range);
        assert_eq!(reservation.status(), ReservationStatus::Pending);
        assert_eq!(reservation.slot_count(), 0);
        assert_eq!(reservation.comment(), Some("two walks"));
        let mut pets = reservation.pets().to_vec();
        pets.sort();
        assert_eq!(pets, vec![PetId::new(5), PetId::new(6)]);
    }

    #[test]
    fn test_get_missing_reservation() {
        let db = create_test_database();
        let result = Database::get_reservation(db.connection(), ReservationId::new(99)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_compare_and_set_state() {
        let mut db = create_test_database();
        db.seed_states().unwrap();
        let pending = state(&db, "Pending");
        let approved = state(&db, "Approved");
        let range = DateRange::new(day(2024, 3, 1), day(2024, 3, 1)).unwrap();

        let conn = db.connection();
        let id = Database::insert_reservation(conn, &new_reservation(&range, pending)).unwrap();

        assert!(Database::compare_and_set_state(conn, id, pending, approved).unwrap());
        // Second attempt from the stale state matches nothing.
        assert!(!Database::compare_and_set_state(conn, id, pending, approved).unwrap());
        assert!(!Database::delete_reservation_if_state(conn, id, pending).unwrap());
        assert!(Database::delete_reservation_if_state(conn, id, approved).unwrap());
        assert!(Database::get_reservation(conn, id).unwrap().is_none());
    }

    #[test]
    fn test_find_overlapping_reservations() {
        let mut db = create_test_database();
        db.seed_states().unwrap();
        let pending = state(&db, "Pending");
        let approved = state(&db, "Approved");
        let cancelled = state(&db, "Cancelled");
        let conn = db.connection();

        let march = DateRange::new(day(2024, 3, 1), day(2024, 3, 3)).unwrap();
        let april = DateRange::new(day(2024, 4, 1), day(2024, 4, 2)).unwrap();
        let live = Database::insert_reservation(conn, &new_reservation(&march, pending)).unwrap();
        let gone = Database::insert_reservation(conn, &new_reservation(&march, cancelled)).unwrap();
        Database::insert_reservation(conn, &new_reservation(&april, approved)).unwrap();

        let query = DateRange::new(day(2024, 3, 3), day(2024, 3, 10)).unwrap();
        let found = Database::find_overlapping_reservations(
            conn,
            UserId::new(2),
            query.starts_at(),
            query.ends_at(),
            [pending, approved],
        )
        .unwrap();

        let ids: Vec<_> = found.iter().map(Reservation::id).collect();
        assert_eq!(ids, vec![live]);
        assert!(!ids.contains(&gone));
    }

    #[test]
    fn test_find_elapsed_reservations() {
        let mut db = create_test_database();
        db.seed_states().unwrap();
        let approved = state(&db, "Approved");
        let conn = db.connection();

        let range = DateRange::new(day(2024, 3, 1), day(2024, 3, 3)).unwrap();
        let id = Database::insert_reservation(conn, &new_reservation(&range, approved)).unwrap();

        let on_last_day = day(2024, 3, 3).and_hms_opt(23, 0, 0).unwrap().and_utc();
        let next_day = day(2024, 3, 4).and_hms_opt(0, 0, 0).unwrap().and_utc();

        assert!(Database::find_elapsed_reservations(conn, approved, on_last_day)
            .unwrap()
            .is_empty());
        let elapsed = Database::find_elapsed_reservations(conn, approved, next_day).unwrap();
        assert_eq!(elapsed.len(), 1);
        assert_eq!(elapsed[0].id(), id);
    }
}
