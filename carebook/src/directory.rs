//! Caregiver lookup.
//!
//! The engine only needs two facts about a caregiver: whether they hold the
//! enabled-caregiver role and their current hourly rate. [`CaregiverDirectory`]
//! is the seam to whatever identity store provides them. [`SqliteDirectory`]
//! reads the bundled `users` table; [`InMemoryDirectory`] is a fixed map for
//! tests and embedding.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::database::{Database, DatabaseConfig};
use crate::error::Result;
use crate::reservation::{Money, UserId};

/// Role of a user in the identity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// Books reservations.
    Client,
    /// Registered as caregiver, awaiting approval.
    PendingCaregiver,
    /// Approved caregiver; the only role that can be booked.
    EnabledCaregiver,
    /// Back-office operator.
    Administrator,
}

impl UserRole {
    /// Every role.
    pub const ALL: [Self; 4] = [
        Self::Client,
        Self::PendingCaregiver,
        Self::EnabledCaregiver,
        Self::Administrator,
    ];

    /// Stored name of the role.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::PendingCaregiver => "Pending Caregiver",
            Self::EnabledCaregiver => "Enabled Caregiver",
            Self::Administrator => "Administrator",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UserRole {
    type Err = String;

    /// Accepts the stored name or a kebab-case form (`enabled-caregiver`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Current role.
    pub role: UserRole,
    /// Hourly rate; zero for non-caregivers.
    pub hourly_rate: Money,
}

/// What the engine needs to know about a caregiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaregiverProfile {
    /// Caregiver identifier.
    pub id: UserId,
    /// Whether the caregiver holds the enabled-caregiver role.
    pub enabled: bool,
    /// Current hourly rate.
    pub hourly_rate: Money,
}

impl From<&User> for CaregiverProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            enabled: user.role == UserRole::EnabledCaregiver,
            hourly_rate: user.hourly_rate,
        }
    }
}

/// Read-only source of caregiver eligibility and rates.
pub trait CaregiverDirectory: Send {
    /// Looks up a caregiver.
    ///
    /// Returns `Ok(None)` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn find_caregiver(&self, id: UserId) -> Result<Option<CaregiverProfile>>;
}

/// Directory backed by the `users` table, on its own connection.
#[derive(Debug)]
pub struct SqliteDirectory {
    db: Database,
}

impl SqliteDirectory {
    /// Opens a connection to the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        Ok(Self {
            db: Database::open(config)?,
        })
    }
}

impl CaregiverDirectory for SqliteDirectory {
    fn find_caregiver(&self, id: UserId) -> Result<Option<CaregiverProfile>> {
        let user = Database::get_user(self.db.connection(), id)?;
        Ok(user.as_ref().map(CaregiverProfile::from))
    }
}

/// Fixed in-memory directory.
///
/// # Examples
///
/// ```
/// use carebook::{CaregiverDirectory, InMemoryDirectory, Money, UserId};
///
/// let directory = InMemoryDirectory::new()
///     .with_caregiver(UserId::new(2), true, Money::from_cents(2000));
///
/// let profile = directory.find_caregiver(UserId::new(2)).unwrap().unwrap();
/// assert!(profile.enabled);
/// assert!(directory.find_caregiver(UserId::new(3)).unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    caregivers: HashMap<UserId, CaregiverProfile>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a caregiver.
    #[must_use]
    pub fn with_caregiver(mut self, id: UserId, enabled: bool, hourly_rate: Money) -> Self {
        self.caregivers.insert(
            id,
            CaregiverProfile {
                id,
                enabled,
                hourly_rate,
            },
        );
        self
    }
}

impl CaregiverDirectory for InMemoryDirectory {
    fn find_caregiver(&self, id: UserId) -> Result<Option<CaregiverProfile>> {
        Ok(self.caregivers.get(&id).copied())
    }
}
