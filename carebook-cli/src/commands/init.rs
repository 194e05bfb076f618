//! Init command implementation.
//!
//! Creates the data directory and database, then seeds the state catalog.
//! Running it again is harmless: existing states are kept.

use crate::error::CliError;
use crate::utils::{resolve_data_dir, GlobalOptions};
use carebook::database::DATABASE_FILE_NAME;
use carebook::{Database, DatabaseConfig};
use clap::Parser;
use std::fs;

/// Template written by `init --with-config`.
const DEFAULT_CONFIG: &str = "\
# carebook user configuration
sweep:
  interval_hours: 24
  enabled: true
catalog:
  refresh_seconds: 300
notifications:
  sink: log          # log | outbox | none
  mode: background   # background | inline
maximum_lock_wait_seconds: 5
display_offset_minutes: 0
output_format: table # table | json | csv
";

/// Initialize the data directory and state catalog.
#[derive(Parser)]
pub struct InitCommand {
    /// Create a commented configuration file in the data directory
    #[arg(long)]
    with_config: bool,

    /// Preview actions without executing
    #[arg(long)]
    dry_run: bool,
}

impl InitCommand {
    /// Execute the init command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let data_dir = resolve_data_dir(global)?;
        let db_path = data_dir.join(DATABASE_FILE_NAME);
        let config_path = data_dir.join("config.yaml");

        if self.dry_run {
            println!("Dry-run mode: no changes will be made");
            println!("Would initialize carebook in: {}", data_dir.display());
            if db_path.exists() {
                println!("  - Database already exists: {}", db_path.display());
            } else {
                println!("  - Create database: {}", db_path.display());
            }
            println!("  - Seed missing reservation states");
            if self.with_config && !config_path.exists() {
                println!("  - Create configuration file: {}", config_path.display());
            }
            return Ok(());
        }

        let database_created = !db_path.exists();
        let mut db = Database::open(DatabaseConfig::new(&db_path))?;
        let seeded = db.seed_states()?;

        let config_created = self.with_config && !config_path.exists();
        if config_created {
            fs::write(&config_path, DEFAULT_CONFIG)?;
        }

        if !global.quiet {
            println!("Initialized carebook in: {}", data_dir.display());
            if database_created {
                println!("  - Created database");
            }
            println!("  - Seeded {seeded} states");
            if config_created {
                println!("  - Created default configuration file");
            } else if self.with_config {
                println!("  - Configuration file already exists (not overwritten)");
            }
        }

        Ok(())
    }
}
