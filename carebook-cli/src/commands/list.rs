//! List command implementation.
//!
//! Displays reservations as a table, JSON or CSV. The row layout and
//! writers here are shared with `in-range`.

use crate::error::CliError;
use crate::utils::{format_instant, load_configuration, open_engine, GlobalOptions};
use carebook::config::OutputFormat;
use carebook::{Reservation, ReservationStatus, UserId};
use chrono::FixedOffset;
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::io::Write;

/// Column headers for CSV output.
const COLUMN_HEADERS: [&str; 10] = [
    "id",
    "status",
    "client",
    "caregiver",
    "start",
    "end",
    "pets",
    "slots",
    "total",
    "created_at",
];

/// List reservations.
#[derive(Args)]
pub struct ListCommand {
    /// Output format (defaults to `output_format` from configuration)
    #[arg(long, value_enum, ignore_case = true)]
    pub format: Option<FormatArg>,

    /// Only reservations booked by this client
    #[arg(long, value_name = "USER_ID", conflicts_with = "caregiver")]
    pub client: Option<i64>,

    /// Only reservations of this caregiver
    #[arg(long, value_name = "USER_ID")]
    pub caregiver: Option<i64>,

    /// Only reservations in this status
    #[arg(long, value_name = "STATUS")]
    pub status: Option<ReservationStatus>,
}

/// Output format flag.
#[derive(Clone, Copy, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum FormatArg {
    /// Tab-separated table format (human-readable)
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

impl ListCommand {
    /// Execute the list command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut engine = open_engine(global, &config)?;

        let listed = match (self.client, self.caregiver) {
            (Some(client), _) => engine.list_for_client(UserId::new(client)),
            (None, Some(caregiver)) => engine.list_for_caregiver(UserId::new(caregiver)),
            (None, None) => engine.list_all(),
        };
        engine.shutdown();

        let mut reservations = listed?;
        if let Some(status) = self.status {
            reservations.retain(|r| r.status() == status);
        }

        let format = self.format.map_or_else(|| config.output_format(), Into::into);
        print_reservations(&reservations, format, config.display_offset())
    }
}

/// One reservation flattened for output.
#[derive(Debug, Serialize)]
pub struct ReservationRow {
    pub id: i64,
    pub status: ReservationStatus,
    pub client: i64,
    pub caregiver: i64,
    pub start: String,
    pub end: String,
    pub pets: Vec<i64>,
    pub slots: u32,
    pub rate: String,
    pub total: String,
    pub comment: Option<String>,
    pub created_at: String,
}

impl ReservationRow {
    /// Flattens `reservation`, showing `created_at` in `offset`.
    pub fn new(reservation: &Reservation, offset: FixedOffset) -> Self {
        Self {
            id: reservation.id().value(),
            status: reservation.status(),
            client: reservation.client().value(),
            caregiver: reservation.caregiver().value(),
            start: reservation.date_range().start().to_string(),
            end: reservation.date_range().end().to_string(),
            pets: reservation.pets().iter().map(|p| p.value()).collect(),
            slots: reservation.slot_count(),
            rate: reservation.rate_per_slot().to_string(),
            total: reservation.total_price().to_string(),
            comment: reservation.comment().map(str::to_string),
            created_at: format_instant(reservation.created_at(), offset),
        }
    }

    fn pets_joined(&self, separator: &str) -> String {
        self.pets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Write reservations to stdout in `format`.
pub fn print_reservations(
    reservations: &[Reservation],
    format: OutputFormat,
    offset: FixedOffset,
) -> Result<(), CliError> {
    let rows: Vec<ReservationRow> = reservations
        .iter()
        .map(|r| ReservationRow::new(r, offset))
        .collect();

    let stdout = std::io::stdout();
    let handle = stdout.lock();
    match format {
        OutputFormat::Table => write_table(handle, &rows),
        OutputFormat::Json => write_json(handle, &rows),
        OutputFormat::Csv => write_csv(handle, &rows),
    }
}

fn write_table(mut out: impl Write, rows: &[ReservationRow]) -> Result<(), CliError> {
    let header_line = COLUMN_HEADERS
        .iter()
        .map(|s| s.to_uppercase())
        .collect::<Vec<_>>()
        .join("\t");
    writeln!(out, "{header_line}")?;

    for row in rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.id,
            row.status,
            row.client,
            row.caregiver,
            row.start,
            row.end,
            row.pets_joined(","),
            row.slots,
            row.total,
            row.created_at,
        )?;
    }
    Ok(())
}

fn write_json(mut out: impl Write, rows: &[ReservationRow]) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut out, rows)?;
    writeln!(out)?;
    Ok(())
}

fn write_csv(out: impl Write, rows: &[ReservationRow]) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(COLUMN_HEADERS)?;
    for row in rows {
        writer.write_record([
            row.id.to_string(),
            row.status.to_string(),
            row.client.to_string(),
            row.caregiver.to_string(),
            row.start.clone(),
            row.end.clone(),
            row.pets_joined(";"),
            row.slots.to_string(),
            row.total.clone(),
            row.created_at.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
