//! User persistence for the bundled identity store.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::directory::{User, UserRole};
use crate::error::Result;
use crate::reservation::{Money, UserId};

use super::connection::Database;

const INSERT_USER: &str = "INSERT INTO users (name, role, hourly_rate_cents) VALUES (?, ?, ?)";

const SELECT_USER: &str = "SELECT id, name, role, hourly_rate_cents FROM users WHERE id = ?";

const SELECT_USERS: &str = "SELECT id, name, role, hourly_rate_cents FROM users ORDER BY id";

const UPDATE_ROLE: &str = "UPDATE users SET role = ? WHERE id = ?";

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(2)?;
    let role = role
        .parse::<UserRole>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?;

    Ok(User {
        id: UserId::new(row.get(0)?),
        name: row.get(1)?,
        role,
        hourly_rate: Money::from_cents(row.get(3)?),
    })
}

impl Database {
    /// Inserts a user and returns the new identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_user(
        conn: &Connection,
        name: &str,
        role: UserRole,
        hourly_rate: Money,
    ) -> Result<UserId> {
        conn.execute(INSERT_USER, params![name, role.name(), hourly_rate.cents()])?;
        Ok(UserId::new(conn.last_insert_rowid()))
    }

    /// Retrieves a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored role is unknown.
    pub fn get_user(conn: &Connection, id: UserId) -> Result<Option<User>> {
        Ok(conn
            .query_row(SELECT_USER, [id.value()], row_to_user)
            .optional()?)
    }

    /// Lists all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
        let mut stmt = conn.prepare(SELECT_USERS)?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Changes a user's role, returning whether the user exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn set_user_role(conn: &Connection, id: UserId, role: UserRole) -> Result<bool> {
        Ok(conn.execute(UPDATE_ROLE, params![role.name(), id.value()])? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util::create_test_database;

    #[test]
    fn test_insert_and_get_user() {
        let db = create_test_database();
        let conn = db.connection();
        let id = Database::insert_user(conn, "Marta", UserRole::Client, Money::ZERO).unwrap();

        let user = Database::get_user(conn, id).unwrap().unwrap();
        assert_eq!(user.name, "Marta");
        assert_eq!(user.role, UserRole::Client);
        assert!(Database::get_user(conn, UserId::new(77)).unwrap().is_none());
    }

    #[test]
    fn test_set_user_role() {
        let db = create_test_database();
        let conn = db.connection();
        let id = Database::insert_user(
            conn,
            "Ana",
            UserRole::PendingCaregiver,
            Money::from_cents(2000),
        )
        .unwrap();

        assert!(Database::set_user_role(conn, id, UserRole::EnabledCaregiver).unwrap());
        assert!(!Database::set_user_role(conn, UserId::new(77), UserRole::Client).unwrap());

        let users = Database::list_users(conn).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, UserRole::EnabledCaregiver);
    }
}
