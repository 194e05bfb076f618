//! Configuration merging and precedence handling.
//!
//! Scalar fields are overwritten by higher-precedence sources when set.
//! Nested sections merge field by field.

use crate::config::loader::ConfigSource;
use crate::config::schema::{CatalogConfig, Config, NotificationConfig, SweepConfig};

/// Merges configuration sources according to precedence rules.
///
/// # Examples
///
/// ```
/// use carebook::config::{Config, ConfigMerger};
///
/// let low = Config { maximum_lock_wait_seconds: Some(5), ..Default::default() };
/// let high = Config { maximum_lock_wait_seconds: Some(30), ..Default::default() };
///
/// let mut result = low;
/// ConfigMerger::merge_into(&mut result, &high);
/// assert_eq!(result.maximum_lock_wait_seconds, Some(30));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge sources, given lowest precedence first.
    #[must_use]
    pub fn merge(sources: Vec<ConfigSource>) -> Config {
        let mut result = Config::default();
        for source in sources {
            Self::merge_into(&mut result, &source.config);
        }
        result
    }

    /// Merge `source` into `target`; set fields in `source` win.
    pub fn merge_into(target: &mut Config, source: &Config) {
        if source.maximum_lock_wait_seconds.is_some() {
            target.maximum_lock_wait_seconds = source.maximum_lock_wait_seconds;
        }

        if source.display_offset_minutes.is_some() {
            target.display_offset_minutes = source.display_offset_minutes;
        }

        if source.output_format.is_some() {
            target.output_format = source.output_format;
        }

        if let Some(ref source_sweep) = source.sweep {
            target.sweep = Some(match &target.sweep {
                Some(target_sweep) => Self::merge_sweep(target_sweep, source_sweep),
                None => source_sweep.clone(),
            });
        }

        if let Some(ref source_catalog) = source.catalog {
            target.catalog = Some(match &target.catalog {
                Some(target_catalog) => Self::merge_catalog(target_catalog, source_catalog),
                None => source_catalog.clone(),
            });
        }

        if let Some(ref source_notifications) = source.notifications {
            target.notifications = Some(match &target.notifications {
                Some(target_notifications) => {
                    Self::merge_notifications(target_notifications, source_notifications)
                }
                None => source_notifications.clone(),
            });
        }
    }

    fn merge_sweep(target: &SweepConfig, source: &SweepConfig) -> SweepConfig {
        SweepConfig {
            interval_hours: source.interval_hours.or(target.interval_hours),
            enabled: source.enabled.or(target.enabled),
        }
    }

    fn merge_catalog(target: &CatalogConfig, source: &CatalogConfig) -> CatalogConfig {
        CatalogConfig {
            refresh_seconds: source.refresh_seconds.or(target.refresh_seconds),
        }
    }

    fn merge_notifications(
        target: &NotificationConfig,
        source: &NotificationConfig,
    ) -> NotificationConfig {
        NotificationConfig {
            sink: source.sink.or(target.sink),
            outbox_path: source
                .outbox_path
                .clone()
                .or_else(|| target.outbox_path.clone()),
            mode: source.mode.or(target.mode),
        }
    }
}
