//! Configuration validation.
//!
//! Serde already rejects unknown keys and mistyped values; this module
//! checks the ranges that types alone cannot express.

use crate::config::schema::{CatalogConfig, Config, NotificationConfig, SweepConfig};
use crate::error::{Error, Result};

/// Largest accepted display offset, in minutes (UTC+14:00).
pub const MAX_DISPLAY_OFFSET_MINUTES: i32 = 14 * 60;

/// Longest accepted sweep interval, one year in hours.
pub const MAX_SWEEP_INTERVAL_HOURS: u64 = 366 * 24;

/// Validates configuration values.
///
/// # Examples
///
/// ```
/// use carebook::config::{Config, ConfigValidator};
///
/// let config = Config::default();
/// ConfigValidator::validate(&config).unwrap();
///
/// let bad = Config { maximum_lock_wait_seconds: Some(0), ..Default::default() };
/// assert!(ConfigValidator::validate(&bad).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        if let Some(ref sweep) = config.sweep {
            Self::validate_sweep(sweep)?;
        }

        if let Some(ref catalog) = config.catalog {
            Self::validate_catalog(catalog)?;
        }

        if let Some(ref notifications) = config.notifications {
            Self::validate_notifications(notifications)?;
        }

        if config.maximum_lock_wait_seconds == Some(0) {
            return Err(invalid(
                "maximum_lock_wait_seconds",
                "timeout must be greater than 0",
            ));
        }

        if let Some(minutes) = config.display_offset_minutes {
            if minutes.abs() > MAX_DISPLAY_OFFSET_MINUTES {
                return Err(invalid(
                    "display_offset_minutes",
                    format!("offset must be within ±{MAX_DISPLAY_OFFSET_MINUTES} minutes"),
                ));
            }
        }

        Ok(())
    }

    fn validate_sweep(sweep: &SweepConfig) -> Result<()> {
        match sweep.interval_hours {
            Some(0) => Err(invalid(
                "sweep.interval_hours",
                "interval must be at least one hour",
            )),
            Some(hours) if hours > MAX_SWEEP_INTERVAL_HOURS => Err(invalid(
                "sweep.interval_hours",
                format!("interval cannot exceed {MAX_SWEEP_INTERVAL_HOURS} hours"),
            )),
            _ => Ok(()),
        }
    }

    fn validate_catalog(catalog: &CatalogConfig) -> Result<()> {
        if catalog.refresh_seconds == Some(0) {
            return Err(invalid(
                "catalog.refresh_seconds",
                "refresh interval must be greater than 0",
            ));
        }
        Ok(())
    }

    fn validate_notifications(notifications: &NotificationConfig) -> Result<()> {
        if let Some(ref path) = notifications.outbox_path {
            if path.as_os_str().is_empty() {
                return Err(invalid(
                    "notifications.outbox_path",
                    "path cannot be empty",
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::Validation {
        field: field.into(),
        message: message.into(),
    }
}
