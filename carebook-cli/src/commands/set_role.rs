//! Set-role command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, GlobalOptions};
use carebook::{Database, Error, UserId, UserRole};
use clap::Args;

/// Change the role of a user.
#[derive(Args)]
pub struct SetRoleCommand {
    /// User identifier
    #[arg(value_name = "USER_ID")]
    pub user: i64,

    /// New role
    #[arg(value_name = "ROLE")]
    pub role: UserRole,
}

impl SetRoleCommand {
    /// Execute the set-role command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let db = open_database(global, &config)?;
        let user = UserId::new(self.user);

        if !Database::set_user_role(db.connection(), user, self.role)? {
            return Err(Error::NotFound {
                resource: format!("user {user}"),
            }
            .into());
        }

        if !global.quiet {
            println!("user {user}: {}", self.role);
        }
        Ok(())
    }
}
