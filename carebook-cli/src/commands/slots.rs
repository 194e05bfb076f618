//! Slots command implementation.

use crate::error::CliError;
use crate::utils::{format_instant, load_configuration, open_engine, GlobalOptions};
use carebook::ReservationId;
use clap::Args;
use std::io::Write;

/// List the slots of a reservation.
#[derive(Args)]
pub struct SlotsCommand {
    /// Reservation identifier
    #[arg(value_name = "RESERVATION_ID")]
    pub id: i64,

    /// Include slots released by a rejection, cancellation or annulment
    #[arg(long)]
    pub all: bool,
}

impl SlotsCommand {
    /// Execute the slots command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let engine = open_engine(global, &config)?;
        let listed = engine.slots_for(ReservationId::new(self.id));
        engine.shutdown();

        let offset = config.display_offset();
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "SLOT\tSTARTS_AT\tDELETED")?;
        for slot in listed?.into_iter().filter(|s| self.all || !s.deleted) {
            writeln!(
                handle,
                "{}\t{}\t{}",
                slot.id,
                format_instant(slot.starts_at, offset),
                if slot.deleted { "yes" } else { "no" }
            )?;
        }
        Ok(())
    }
}
