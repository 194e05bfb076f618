//! Database schema management and migrations.
//!
//! This module handles database schema initialization and version checking.

use rusqlite::Connection;

use crate::error::{Error, Result};

use super::schema::{
    CREATE_CAREGIVER_INDEX, CREATE_CLIENT_INDEX, CREATE_METADATA_TABLE,
    CREATE_RESERVATIONS_TABLE, CREATE_RESERVATION_PETS_TABLE, CREATE_SLOTS_RESERVATION_INDEX,
    CREATE_SLOTS_TABLE, CREATE_STATES_TABLE, CREATE_STATE_END_INDEX, CREATE_USERS_TABLE,
    CURRENT_SCHEMA_VERSION, INSERT_SCHEMA_VERSION, SELECT_SCHEMA_VERSION,
};

/// Initializes the database schema.
///
/// Creates all tables, indices and the schema version entry. Every statement
/// is idempotent.
///
/// # Errors
///
/// Returns an error if any SQL statement fails to execute.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use carebook::database::migrations::initialize_schema;
///
/// let conn = Connection::open_in_memory().unwrap();
/// initialize_schema(&conn).unwrap();
/// ```
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in [
        CREATE_METADATA_TABLE,
        CREATE_STATES_TABLE,
        CREATE_USERS_TABLE,
        CREATE_RESERVATIONS_TABLE,
        CREATE_RESERVATION_PETS_TABLE,
        CREATE_SLOTS_TABLE,
        CREATE_CAREGIVER_INDEX,
        CREATE_CLIENT_INDEX,
        CREATE_STATE_END_INDEX,
        CREATE_SLOTS_RESERVATION_INDEX,
    ] {
        conn.execute(statement, [])?;
    }

    conn.execute(INSERT_SCHEMA_VERSION, [CURRENT_SCHEMA_VERSION])?;
    log::info!("initialized database schema version {CURRENT_SCHEMA_VERSION}");

    Ok(())
}

/// Gets the current schema version from the database.
///
/// # Errors
///
/// Returns an error if the query fails for reasons other than a missing
/// metadata table or row (both of which mean version 0).
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    match conn.query_row(SELECT_SCHEMA_VERSION, [], |row| {
        let value: String = row.get(0)?;
        value.parse::<i32>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => {
            // "no such table" surfaces as a generic error code
            if let rusqlite::Error::SqliteFailure(ref sqlite_err, _) = e {
                if sqlite_err.code == rusqlite::ErrorCode::Unknown {
                    return Ok(0);
                }
            }
            Err(e.into())
        }
    }
}

/// Checks schema compatibility and initializes if needed.
///
/// A fresh database is initialized. A database whose version differs from
/// [`CURRENT_SCHEMA_VERSION`] is refused.
///
/// # Errors
///
/// Returns [`Error::UnsupportedSchemaVersion`] on a version mismatch, or a
/// storage error if a query fails.
pub fn check_schema_compatibility(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        initialize_schema(conn)?;
    } else if version != CURRENT_SCHEMA_VERSION {
        return Err(Error::UnsupportedSchemaVersion {
            expected: CURRENT_SCHEMA_VERSION,
            found: version,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_connection() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_initialize_schema() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);

        for table in ["states", "users", "reservations", "reservation_pets", "slots"] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 0, "{table} should start empty");
        }
    }

    #[test]
    fn test_get_schema_version_uninitialized() {
        let conn = create_test_connection();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_check_schema_compatibility_fresh_database() {
        let conn = create_test_connection();
        check_schema_compatibility(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);

        // Second call is a no-op
        check_schema_compatibility(&conn).unwrap();
    }

    #[test]
    fn test_check_schema_compatibility_newer_version() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = '999' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();

        let err = check_schema_compatibility(&conn).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedSchemaVersion {
                expected: CURRENT_SCHEMA_VERSION,
                found: 999
            }
        ));
    }

    #[test]
    fn test_schema_creates_all_indices() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();

        let index_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 4);
    }

    #[test]
    fn test_reservation_range_check_constraint() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();
        conn.execute("INSERT INTO states (name) VALUES ('Pending')", [])
            .unwrap();

        let result = conn.execute(
            "INSERT INTO reservations (start_at, end_at, client_id, caregiver_id, rate_cents, state_id, created_at)
             VALUES ('2024-03-02T00:00:00.000Z', '2024-03-01T23:59:59.999Z', 1, 2, 0, 1, '2024-01-01T00:00:00.000Z')",
            [],
        );
        assert!(result.is_err());
    }
}
