//! Create command implementation.
//!
//! Prints the new reservation's identifier on stdout. Slots come either from
//! `--hour` (one per day at the same hour) or from explicit `--slot` values.

use crate::error::CliError;
use crate::utils::{load_configuration, open_engine, parse_day, GlobalOptions};
use carebook::{CreateOptions, PetId, SlotRequest, UserId};
use chrono::NaiveDate;
use clap::Args;

/// Create a pending reservation.
#[derive(Args)]
pub struct CreateCommand {
    /// Booking client
    #[arg(long, value_name = "USER_ID")]
    pub client: i64,

    /// Caregiver to book
    #[arg(long, value_name = "USER_ID")]
    pub caregiver: i64,

    /// First day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_day)]
    pub start: NaiveDate,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_day)]
    pub end: NaiveDate,

    /// Pet covered by the reservation (repeatable)
    #[arg(long = "pet", value_name = "PET_ID", required = true)]
    pub pets: Vec<i64>,

    /// Appointment hour used for every day of the range
    #[arg(long, value_name = "HOUR", conflicts_with = "slots")]
    pub hour: Option<u8>,

    /// Explicit appointment as YYYY-MM-DD@HH (repeatable, one per day)
    #[arg(long = "slot", value_name = "DAY@HOUR")]
    pub slots: Vec<SlotRequest>,

    /// Free-text comment
    #[arg(long)]
    pub comment: Option<String>,
}

impl CreateCommand {
    /// Execute the create command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let options = self.into_options()?;

        let config = load_configuration(global)?;
        let mut engine = open_engine(global, &config)?;
        let result = engine.create(options);
        engine.shutdown();
        let reservation = result?;

        log::info!(
            "created reservation {} for {} ({} slots, {} total)",
            reservation.id(),
            reservation.date_range(),
            reservation.slot_count(),
            reservation.total_price()
        );
        println!("{}", reservation.id());
        Ok(())
    }

    fn into_options(self) -> Result<CreateOptions, CliError> {
        let options = CreateOptions::new(
            UserId::new(self.client),
            UserId::new(self.caregiver),
            self.start,
            self.end,
        )
        .with_pets(self.pets.into_iter().map(PetId::new).collect())
        .with_comment(self.comment);

        match self.hour {
            Some(hour) => options
                .with_daily_slots(hour)
                .map_err(|e| CliError::from(carebook::Error::from(e))),
            None if self.slots.is_empty() => Err(CliError::InvalidArguments(
                "either --hour or at least one --slot is required".to_string(),
            )),
            None => Ok(options.with_slots(self.slots)),
        }
    }
}
