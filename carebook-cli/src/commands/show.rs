//! Show command implementation.

use crate::commands::list::ReservationRow;
use crate::error::CliError;
use crate::utils::{load_configuration, open_engine, GlobalOptions};
use carebook::ReservationId;
use clap::Args;

/// Show one reservation.
#[derive(Args)]
pub struct ShowCommand {
    /// Reservation identifier
    #[arg(value_name = "RESERVATION_ID")]
    pub id: i64,

    /// Print JSON instead of `key: value` lines
    #[arg(long)]
    pub json: bool,
}

impl ShowCommand {
    /// Execute the show command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let engine = open_engine(global, &config)?;
        let id = ReservationId::new(self.id);
        let found = engine.get(id);
        let hour = engine.appointment_hour(id);
        engine.shutdown();

        let row = ReservationRow::new(&found?, config.display_offset());
        let hour = hour?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&row)?);
            return Ok(());
        }

        println!("id:         {}", row.id);
        println!("status:     {}", row.status);
        println!("client:     {}", row.client);
        println!("caregiver:  {}", row.caregiver);
        println!("dates:      {} .. {}", row.start, row.end);
        if let Some(hour) = hour {
            println!("hour:       {hour:02}:00");
        }
        println!("pets:       {}", joined(&row.pets));
        println!("slots:      {}", row.slots);
        println!("rate:       {}", row.rate);
        println!("total:      {}", row.total);
        if let Some(ref comment) = row.comment {
            println!("comment:    {comment}");
        }
        println!("created at: {}", row.created_at);
        Ok(())
    }
}

fn joined(ids: &[i64]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

