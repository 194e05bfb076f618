//! Utility functions for CLI operations.
//!
//! Configuration loading, database and engine setup, notification sink
//! selection and timestamp formatting shared by the commands.

use crate::error::CliError;
use carebook::config::SinkKind;
use carebook::database::{default_data_dir, DATABASE_FILE_NAME};
use carebook::notify::{
    DispatchMode, JsonLinesSink, LogSink, NotificationDispatcher, NotificationSink,
};
use carebook::{Config, ConfigBuilder, Database, DatabaseConfig, ReservationEngine};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Override the data directory location.
    pub data_dir: Option<PathBuf>,

    /// Override the database busy timeout (in seconds).
    pub busy_timeout: Option<u64>,
}

/// Resolve the data directory: `--data-dir` or `~/.carebook`.
pub fn resolve_data_dir(global: &GlobalOptions) -> Result<PathBuf, CliError> {
    match global.data_dir {
        Some(ref dir) => Ok(dir.clone()),
        None => default_data_dir().map_err(|e| CliError::Config(e.to_string())),
    }
}

/// Path of the database file inside the data directory.
pub fn resolve_database_path(global: &GlobalOptions) -> Result<PathBuf, CliError> {
    Ok(resolve_data_dir(global)?.join(DATABASE_FILE_NAME))
}

/// Load hierarchical configuration.
///
/// Configuration is merged from multiple sources with precedence:
/// 1. Environment variables (highest priority)
/// 2. `carebook.local.yaml` and `carebook.yaml` found from the working directory upward
/// 3. `config.yaml` in the data directory
/// 4. Built-in defaults (lowest priority)
pub fn load_configuration(global: &GlobalOptions) -> Result<Config, CliError> {
    let data_dir = resolve_data_dir(global)?;
    ConfigBuilder::new()
        .with_data_dir(&data_dir)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

/// Database settings for an existing database.
///
/// # Errors
///
/// Returns `NoDataDirectory` if the database has not been initialized.
pub fn database_config(global: &GlobalOptions, config: &Config) -> Result<DatabaseConfig, CliError> {
    let db_path = resolve_database_path(global)?;
    if !db_path.exists() {
        return Err(CliError::NoDataDirectory(db_path));
    }

    let busy_timeout = global
        .busy_timeout
        .map_or_else(|| config.lock_wait(), Duration::from_secs);

    Ok(DatabaseConfig::new(db_path)
        .with_busy_timeout(busy_timeout)
        .without_auto_create())
}

/// Open the database for direct table access.
pub fn open_database(global: &GlobalOptions, config: &Config) -> Result<Database, CliError> {
    Database::open(database_config(global, config)?).map_err(CliError::from)
}

/// The notification sink selected by `notifications.sink`, if any.
pub fn build_sink(
    global: &GlobalOptions,
    config: &Config,
) -> Result<Option<Arc<dyn NotificationSink>>, CliError> {
    let sink: Option<Arc<dyn NotificationSink>> = match config.sink_kind() {
        SinkKind::Log => Some(Arc::new(LogSink)),
        SinkKind::Outbox => {
            let path = config.outbox_path(&resolve_data_dir(global)?);
            log::debug!("delivering notifications to {}", path.display());
            Some(Arc::new(JsonLinesSink::new(path)))
        }
        SinkKind::None => None,
    };
    Ok(sink)
}

/// Open an engine wired to the configured sink and catalog refresh.
///
/// Callers must [`ReservationEngine::shutdown`] the engine so queued
/// notifications are flushed before the process exits.
pub fn open_engine(
    global: &GlobalOptions,
    config: &Config,
) -> Result<ReservationEngine, CliError> {
    open_engine_with_mode(global, config, config.dispatch_mode())
}

/// Like [`open_engine`], but delivering in `mode` whatever the configuration
/// says.
pub fn open_engine_with_mode(
    global: &GlobalOptions,
    config: &Config,
    mode: DispatchMode,
) -> Result<ReservationEngine, CliError> {
    let db_config = database_config(global, config)?;
    let notifier = match build_sink(global, config)? {
        Some(sink) => NotificationDispatcher::new(mode, sink)?,
        None => NotificationDispatcher::disabled(),
    };

    let engine = ReservationEngine::open(db_config, notifier)?
        .with_catalog_refresh(config.catalog_refresh_interval());
    Ok(engine)
}

/// Format an instant in the configured display offset.
pub fn format_instant(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant
        .with_timezone(&offset)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Parse a `YYYY-MM-DD` day argument.
pub fn parse_day(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{value}' (expected YYYY-MM-DD): {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_instant_applies_offset() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 15, 2, 30, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let minus_three = FixedOffset::west_opt(3 * 3600).unwrap();

        assert_eq!(format_instant(instant, utc), "2024-01-15 02:30");
        assert_eq!(format_instant(instant, minus_three), "2024-01-14 23:30");
    }

    #[test]
    fn test_parse_day() {
        assert_eq!(
            parse_day("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_day("2023-02-29").is_err());
        assert!(parse_day("29/02/2024").is_err());
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let global = GlobalOptions {
            data_dir: Some(PathBuf::from("/srv/carebook")),
            ..GlobalOptions::default()
        };
        assert_eq!(
            resolve_database_path(&global).unwrap(),
            PathBuf::from("/srv/carebook/carebook.db")
        );
    }

    #[test]
    fn test_engine_mode_override_beats_configuration() {
        let dir = tempfile::tempdir().unwrap();
        Database::open(DatabaseConfig::new(dir.path().join(DATABASE_FILE_NAME))).unwrap();
        let global = GlobalOptions {
            data_dir: Some(dir.path().to_path_buf()),
            ..GlobalOptions::default()
        };
        let config: Config =
            serde_yaml::from_str("notifications:\n  sink: log\n  mode: inline\n").unwrap();

        let engine = open_engine(&global, &config).unwrap();
        assert_eq!(engine.notifier().mode(), Some(DispatchMode::Inline));
        engine.shutdown();

        let engine = open_engine_with_mode(&global, &config, DispatchMode::Background).unwrap();
        assert_eq!(engine.notifier().mode(), Some(DispatchMode::Background));
        engine.shutdown();
    }

    #[test]
    fn test_missing_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let global = GlobalOptions {
            data_dir: Some(dir.path().to_path_buf()),
            ..GlobalOptions::default()
        };
        let err = database_config(&global, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoDataDirectory(_)));
        assert_eq!(err.exit_code(), 3);
    }
}
