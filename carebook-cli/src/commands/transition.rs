//! Lifecycle transition commands: approve, reject, cancel, annul, delete.
//!
//! One argument shape serves every transition; `main` picks the operation.

use crate::error::CliError;
use crate::utils::{load_configuration, open_engine, GlobalOptions};
use carebook::{Error, ReservationEngine, ReservationId, ReservationStatus, Transition};
use clap::Args;

/// Apply a lifecycle transition to one reservation.
#[derive(Args)]
pub struct TransitionCommand {
    /// Reservation identifier
    #[arg(value_name = "RESERVATION_ID")]
    pub id: i64,
}

impl TransitionCommand {
    /// Execute `transition` against the reservation.
    pub fn execute(self, transition: Transition, global: &GlobalOptions) -> Result<(), CliError> {
        let id = ReservationId::new(self.id);
        let config = load_configuration(global)?;
        let mut engine = open_engine(global, &config)?;

        let result = apply(&mut engine, transition, id);
        // Flushes queued notifications before reporting
        engine.shutdown();

        match result? {
            Some(status) if !global.quiet => println!("reservation {id}: {status}"),
            None if !global.quiet => println!("reservation {id}: deleted"),
            _ => {}
        }
        Ok(())
    }
}

/// Runs the transition, returning the new status or `None` after a delete.
fn apply(
    engine: &mut ReservationEngine,
    transition: Transition,
    id: ReservationId,
) -> carebook::Result<Option<ReservationStatus>> {
    let reservation = match transition {
        Transition::Approve => engine.approve(id)?,
        Transition::Reject => engine.reject(id)?,
        Transition::Cancel => engine.cancel(id)?,
        Transition::Annul => engine.annul(id)?,
        Transition::Delete => {
            engine.delete(id)?;
            return Ok(None);
        }
        Transition::Complete => {
            return Err(Error::Validation {
                field: "transition".into(),
                message: "reservations are completed by `carebook sweep`".into(),
            })
        }
    };
    Ok(Some(reservation.status()))
}
