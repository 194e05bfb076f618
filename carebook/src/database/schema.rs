//! Database schema definitions and SQL constants.
//!
//! Instants are stored as RFC 3339 UTC text with millisecond precision and a
//! `Z` suffix, so lexical comparison in SQL matches chronological order.

/// Current schema version for the database.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Key-value metadata, including the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )";

/// The state catalog. Identifiers are never reused.
pub const CREATE_STATES_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS states (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE
    )";

/// Users known to the identity store; caregivers carry an hourly rate.
pub const CREATE_USERS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        role TEXT NOT NULL,
        hourly_rate_cents INTEGER NOT NULL DEFAULT 0
    )";

/// Reservations. `rate_cents` is the caregiver rate captured at creation.
pub const CREATE_RESERVATIONS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS reservations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        start_at TEXT NOT NULL,
        end_at TEXT NOT NULL,
        client_id INTEGER NOT NULL,
        caregiver_id INTEGER NOT NULL,
        rate_cents INTEGER NOT NULL,
        slot_count INTEGER NOT NULL DEFAULT 0,
        comment TEXT,
        state_id INTEGER NOT NULL REFERENCES states(id),
        created_at TEXT NOT NULL,
        CHECK (start_at <= end_at)
    )";

/// Pets covered by a reservation.
pub const CREATE_RESERVATION_PETS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS reservation_pets (
        reservation_id INTEGER NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
        pet_id INTEGER NOT NULL,
        PRIMARY KEY (reservation_id, pet_id)
    )";

/// Per-day appointment slots.
pub const CREATE_SLOTS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS slots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        starts_at TEXT NOT NULL,
        reservation_id INTEGER NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
        deleted INTEGER NOT NULL DEFAULT 0
    )";

/// Speeds up range queries per caregiver.
pub const CREATE_CAREGIVER_INDEX: &str = r"
    CREATE INDEX IF NOT EXISTS idx_reservations_caregiver
    ON reservations(caregiver_id, start_at, end_at)";

/// Speeds up listing by client.
pub const CREATE_CLIENT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_reservations_client ON reservations(client_id)";

/// Speeds up the sweep's scan for elapsed reservations.
pub const CREATE_STATE_END_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_reservations_state_end ON reservations(state_id, end_at)";

/// Speeds up slot lookups by reservation.
pub const CREATE_SLOTS_RESERVATION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_slots_reservation ON slots(reservation_id)";

/// SQL statement to select the schema version from the metadata table.
pub const SELECT_SCHEMA_VERSION: &str = "SELECT value FROM metadata WHERE key = 'schema_version'";

/// SQL statement to insert or update the schema version in the metadata table.
pub const INSERT_SCHEMA_VERSION: &str =
    "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)";
