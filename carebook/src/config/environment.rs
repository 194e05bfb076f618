//! Environment variable handling for configuration overrides.
//!
//! `CAREBOOK_*` variables override configuration file values.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::schema::{Config, OutputFormat, SinkKind};
use crate::error::{Error, Result};
use crate::notify::DispatchMode;

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use carebook::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable holds a value of the wrong shape.
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        if let Some(hours) = Self::parsed::<u64>("CAREBOOK_SWEEP_INTERVAL_HOURS")? {
            config.sweep.get_or_insert_with(Default::default).interval_hours = Some(hours);
        }

        if let Ok(val) = env::var("CAREBOOK_SWEEP_ENABLED") {
            config.sweep.get_or_insert_with(Default::default).enabled =
                Some(Self::parse_bool("CAREBOOK_SWEEP_ENABLED", &val)?);
        }

        if let Some(seconds) = Self::parsed::<u64>("CAREBOOK_CATALOG_REFRESH_SECONDS")? {
            config
                .catalog
                .get_or_insert_with(Default::default)
                .refresh_seconds = Some(seconds);
        }

        if let Ok(val) = env::var("CAREBOOK_NOTIFICATION_SINK") {
            let sink = match val.to_lowercase().as_str() {
                "log" => SinkKind::Log,
                "outbox" => SinkKind::Outbox,
                "none" => SinkKind::None,
                _ => {
                    return Err(Error::Validation {
                        field: "CAREBOOK_NOTIFICATION_SINK".into(),
                        message: format!("expected log, outbox or none, got '{val}'"),
                    })
                }
            };
            config
                .notifications
                .get_or_insert_with(Default::default)
                .sink = Some(sink);
        }

        if let Ok(val) = env::var("CAREBOOK_OUTBOX_PATH") {
            config
                .notifications
                .get_or_insert_with(Default::default)
                .outbox_path = Some(PathBuf::from(val));
        }

        if let Ok(val) = env::var("CAREBOOK_NOTIFICATION_MODE") {
            let mode = match val.to_lowercase().as_str() {
                "inline" => DispatchMode::Inline,
                "background" => DispatchMode::Background,
                _ => {
                    return Err(Error::Validation {
                        field: "CAREBOOK_NOTIFICATION_MODE".into(),
                        message: format!("expected inline or background, got '{val}'"),
                    })
                }
            };
            config
                .notifications
                .get_or_insert_with(Default::default)
                .mode = Some(mode);
        }

        if let Some(seconds) = Self::parsed::<u64>("CAREBOOK_MAXIMUM_LOCK_WAIT_SECONDS")? {
            config.maximum_lock_wait_seconds = Some(seconds);
        }

        if let Some(minutes) = Self::parsed::<i32>("CAREBOOK_DISPLAY_OFFSET_MINUTES")? {
            config.display_offset_minutes = Some(minutes);
        }

        if let Ok(val) = env::var("CAREBOOK_OUTPUT_FORMAT") {
            let format = match val.to_lowercase().as_str() {
                "table" => OutputFormat::Table,
                "json" => OutputFormat::Json,
                "csv" => OutputFormat::Csv,
                _ => {
                    return Err(Error::Validation {
                        field: "CAREBOOK_OUTPUT_FORMAT".into(),
                        message: format!("expected table, json or csv, got '{val}'"),
                    })
                }
            };
            config.output_format = Some(format);
        }

        Ok(())
    }

    fn parsed<T: FromStr>(name: &str) -> Result<Option<T>> {
        match env::var(name) {
            Ok(val) => val.trim().parse().map(Some).map_err(|_| Error::Validation {
                field: name.into(),
                message: format!("invalid number '{val}'"),
            }),
            Err(_) => Ok(None),
        }
    }

    /// Parse boolean from environment variable.
    ///
    /// Accepts: true/false, 1/0, yes/no, on/off (case-insensitive).
    fn parse_bool(name: &str, value: &str) -> Result<bool> {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::Validation {
                field: name.into(),
                message: format!("invalid boolean value '{value}'"),
            }),
        }
    }
}
