//! State catalog persistence.

use rusqlite::{Connection, TransactionBehavior};

use crate::catalog::StateId;
use crate::error::Result;
use crate::status::ReservationStatus;

use super::connection::Database;

const SELECT_STATES: &str = "SELECT id, name FROM states ORDER BY id";

const INSERT_STATE: &str = "INSERT OR IGNORE INTO states (name) VALUES (?)";

const SELECT_STATE_ID: &str = "SELECT id FROM states WHERE name = ?";

impl Database {
    /// Loads every `(id, name)` pair of the state catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn load_states(conn: &Connection) -> Result<Vec<(StateId, String)>> {
        let mut stmt = conn.prepare(SELECT_STATES)?;
        let states = stmt
            .query_map([], |row| Ok((StateId::new(row.get(0)?), row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(states)
    }

    /// Inserts a state if its name is new and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or lookup fails.
    pub fn insert_state(conn: &Connection, name: &str) -> Result<StateId> {
        conn.execute(INSERT_STATE, [name])?;
        let id = conn.query_row(SELECT_STATE_ID, [name], |row| row.get(0))?;
        Ok(StateId::new(id))
    }

    /// Seeds the default catalog, one entry per [`ReservationStatus`].
    ///
    /// Existing entries keep their identifiers. Returns the number of states
    /// that were missing and got inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn seed_states(&mut self) -> Result<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(INSERT_STATE)?;
            for status in ReservationStatus::ALL {
                inserted += stmt.execute([status.name()])?;
            }
        }

        tx.commit()?;
        if inserted > 0 {
            log::info!("seeded {inserted} states into catalog");
        }
        Ok(inserted)
    }
}
