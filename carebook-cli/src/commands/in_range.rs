//! In-range command implementation.
//!
//! Shows the pending and approved reservations of one caregiver that
//! intersect a date range, the query behind availability checks.

use crate::commands::list::{print_reservations, FormatArg};
use crate::error::CliError;
use crate::utils::{load_configuration, open_engine, parse_day, GlobalOptions};
use carebook::UserId;
use chrono::NaiveDate;
use clap::Args;

/// List live reservations of a caregiver intersecting a date range.
#[derive(Args)]
pub struct InRangeCommand {
    /// Caregiver to check
    #[arg(long, value_name = "USER_ID")]
    pub caregiver: i64,

    /// First day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_day)]
    pub start: NaiveDate,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_day)]
    pub end: NaiveDate,

    /// Output format (defaults to `output_format` from configuration)
    #[arg(long, value_enum, ignore_case = true)]
    pub format: Option<FormatArg>,
}

impl InRangeCommand {
    /// Execute the in-range command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut engine = open_engine(global, &config)?;
        let found = engine.reservations_in_range(UserId::new(self.caregiver), self.start, self.end);
        engine.shutdown();

        let format = self.format.map_or_else(|| config.output_format(), Into::into);
        print_reservations(&found?, format, config.display_offset())
    }
}
