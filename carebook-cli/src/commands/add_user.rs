//! Add-user command implementation.
//!
//! The bundled `users` table stands in for the identity store. The new
//! user's identifier is printed on stdout so scripts can capture it.

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, GlobalOptions};
use carebook::{Database, Money, UserRole};
use clap::Args;

/// Register a user in the identity store.
#[derive(Args)]
pub struct AddUserCommand {
    /// Display name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Role: client, pending-caregiver, enabled-caregiver or administrator
    #[arg(long, default_value = "client")]
    pub role: UserRole,

    /// Hourly rate, e.g. 25 or 25.50
    #[arg(long, value_name = "AMOUNT", default_value = "0")]
    pub rate: Money,
}

impl AddUserCommand {
    /// Execute the add-user command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if self.name.trim().is_empty() {
            return Err(CliError::InvalidArguments(
                "user name must not be empty".to_string(),
            ));
        }

        let config = load_configuration(global)?;
        let db = open_database(global, &config)?;
        let id = Database::insert_user(db.connection(), self.name.trim(), self.role, self.rate)?;

        log::info!("added {} '{}' as user {id}", self.role, self.name.trim());
        println!("{id}");
        Ok(())
    }
}
