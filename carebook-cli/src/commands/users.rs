//! Users command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, GlobalOptions};
use carebook::Database;
use clap::Args;
use std::io::Write;

/// List registered users.
#[derive(Args)]
pub struct UsersCommand {}

impl UsersCommand {
    /// Execute the users command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let db = open_database(global, &config)?;
        let users = Database::list_users(db.connection())?;

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "ID\tNAME\tROLE\tRATE")?;
        for user in users {
            writeln!(
                handle,
                "{}\t{}\t{}\t{}",
                user.id, user.name, user.role, user.hourly_rate
            )?;
        }
        Ok(())
    }
}
