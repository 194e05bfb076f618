//! Sweep command implementation.
//!
//! Without `--watch`, runs one reconciliation pass and prints the report.
//! With `--watch`, runs the background sweep on the configured interval
//! until interrupted (or for `--max-passes` passes).

use crate::error::CliError;
use crate::utils::{
    build_sink, database_config, load_configuration, open_engine_with_mode, GlobalOptions,
};
use carebook::notify::{DispatchMode, NotificationSink, StatusChangeEvent};
use carebook::sweep::SweepSettings;
use carebook::{ReconciliationSweep, SweepReport};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How often the watcher checks on the sweep thread.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Complete approved reservations whose dates have passed.
#[derive(Args)]
pub struct SweepCommand {
    /// Evaluate as of this instant (RFC 3339, or YYYY-MM-DD for midnight UTC)
    #[arg(long, value_name = "INSTANT", value_parser = parse_instant, conflicts_with = "watch")]
    pub now: Option<DateTime<Utc>>,

    /// Keep sweeping every `sweep.interval_hours`
    #[arg(long)]
    pub watch: bool,

    /// With --watch, stop after this many passes
    #[arg(long, value_name = "N", requires = "watch")]
    pub max_passes: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl SweepCommand {
    /// Execute the sweep command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if self.watch {
            self.watch(global)
        } else {
            self.run_once(global)
        }
    }

    fn run_once(&self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        // A slow sink must not hold up the rest of the batch
        let mut engine = open_engine_with_mode(global, &config, DispatchMode::Background)?;
        let now = self.now.unwrap_or_else(Utc::now);

        let result = ReconciliationSweep::run(&mut engine, now);
        engine.shutdown();
        let report = result?;

        self.print_report(&report, global)?;
        if report.is_clean() {
            Ok(())
        } else {
            Err(CliError::SemanticFailure(format!(
                "{} reservation(s) could not be completed",
                report.failed.len()
            )))
        }
    }

    fn watch(&self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        if !config.sweep_enabled() {
            return Err(CliError::Config(
                "the sweep is disabled (sweep.enabled is false)".to_string(),
            ));
        }

        let db_config = database_config(global, &config)?;
        let sink = build_sink(global, &config)?
            .unwrap_or_else(|| Arc::new(DiscardSink) as Arc<dyn NotificationSink>);
        let settings = SweepSettings::from_config(&config);
        log::info!(
            "sweeping every {}s until interrupted",
            settings.interval.as_secs()
        );

        let handle = ReconciliationSweep::spawn(db_config, settings, sink)?;
        let reached = |passes: u64| self.max_passes.is_some_and(|max| passes >= max);
        while !handle.is_finished() && !reached(handle.passes()) {
            thread::sleep(POLL_INTERVAL);
        }

        let passes = handle.passes();
        let died = handle.is_finished() && !reached(passes);
        handle.stop();

        if died {
            return Err(CliError::SemanticFailure(format!(
                "sweep thread exited after {passes} pass(es)"
            )));
        }
        if !global.quiet {
            println!("{passes} sweep pass(es) finished");
        }
        Ok(())
    }

    fn print_report(&self, report: &SweepReport, global: &GlobalOptions) -> Result<(), CliError> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
            return Ok(());
        }
        if global.quiet {
            return Ok(());
        }

        println!("completed: {}", ids(&report.completed));
        println!("skipped:   {}", ids(&report.skipped));
        for failure in &report.failed {
            println!(
                "failed:    {} [{}] {}",
                failure.reservation, failure.kind, failure.message
            );
        }
        Ok(())
    }
}

fn ids(ids: &[carebook::ReservationId]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse `--now`.
fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|day| day.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|_| format!("invalid instant '{value}' (expected RFC 3339 or YYYY-MM-DD)"))
}

/// Drops events when `notifications.sink` is `none`.
struct DiscardSink;

impl NotificationSink for DiscardSink {
    fn deliver(&self, _event: &StatusChangeEvent) -> carebook::Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "discard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_instant_forms() {
        assert_eq!(
            parse_instant("2024-03-05").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2024-03-05T01:00:00-03:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 4, 0, 0).unwrap()
        );
        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn test_ids_formatting() {
        assert_eq!(ids(&[]), "-");
        assert_eq!(
            ids(&[carebook::ReservationId::new(1), carebook::ReservationId::new(5)]),
            "1, 5"
        );
    }
}
