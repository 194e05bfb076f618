//! Slot persistence.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::reservation::ReservationId;
use crate::slot::{Slot, SlotId};

use super::connection::Database;
use super::reservations::{format_instant, parse_instant};

const INSERT_SLOT: &str =
    "INSERT INTO slots (starts_at, reservation_id, deleted) VALUES (?, ?, 0)";

const SOFT_DELETE_SLOTS: &str =
    "UPDATE slots SET deleted = 1 WHERE reservation_id = ? AND deleted = 0";

const SELECT_SLOTS: &str = r"
    SELECT id, starts_at, reservation_id, deleted
    FROM slots
    WHERE reservation_id = ?
    ORDER BY starts_at, id
";

const COUNT_ACTIVE_SLOTS: &str =
    "SELECT COUNT(*) FROM slots WHERE reservation_id = ? AND deleted = 0";

fn row_to_slot(row: &rusqlite::Row<'_>) -> rusqlite::Result<Slot> {
    let starts_at: String = row.get(1)?;
    Ok(Slot {
        id: SlotId::new(row.get(0)?),
        starts_at: parse_instant(1, &starts_at)?,
        reservation: ReservationId::new(row.get(2)?),
        deleted: row.get(3)?,
    })
}

impl Database {
    /// Inserts one slot for a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including when the reservation
    /// does not exist.
    pub fn insert_slot(
        conn: &Connection,
        reservation: ReservationId,
        starts_at: DateTime<Utc>,
    ) -> Result<SlotId> {
        conn.execute(
            INSERT_SLOT,
            params![format_instant(starts_at), reservation.value()],
        )?;
        Ok(SlotId::new(conn.last_insert_rowid()))
    }

    /// Flags every live slot of a reservation as deleted.
    ///
    /// Returns the number of slots flagged.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn soft_delete_slots(conn: &Connection, reservation: ReservationId) -> Result<usize> {
        Ok(conn.execute(SOFT_DELETE_SLOTS, [reservation.value()])?)
    }

    /// Lists every slot of a reservation, deleted ones included, by time.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_slots(conn: &Connection, reservation: ReservationId) -> Result<Vec<Slot>> {
        let mut stmt = conn.prepare(SELECT_SLOTS)?;
        let slots = stmt
            .query_map([reservation.value()], row_to_slot)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(slots)
    }

    /// Counts the non-deleted slots of a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_active_slots(conn: &Connection, reservation: ReservationId) -> Result<u32> {
        Ok(conn.query_row(COUNT_ACTIVE_SLOTS, [reservation.value()], |row| row.get(0))?)
    }
}
