//! Configuration schema definitions.
//!
//! Every field is optional so that partial files can be layered on top of
//! each other. Accessor methods on [`Config`] apply the built-in defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_REFRESH_INTERVAL;
use crate::notify::DispatchMode;
use crate::sweep::DEFAULT_SWEEP_INTERVAL;

/// Default lock wait, matching the database busy timeout.
pub const DEFAULT_LOCK_WAIT_SECONDS: u64 = 5;

/// File name of the outbox inside the data directory.
pub const DEFAULT_OUTBOX_FILE_NAME: &str = "outbox.jsonl";

/// Complete configuration structure.
///
/// Represents the union of settings accepted in the user config and in
/// project `carebook.yaml` / `carebook.local.yaml` files.
///
/// # Examples
///
/// ```
/// use carebook::config::Config;
/// use std::time::Duration;
///
/// let yaml = r"
/// sweep:
///   interval_hours: 6
/// catalog:
///   refresh_seconds: 60
/// ";
/// let config: Config = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(config.sweep_interval(), Duration::from_secs(6 * 3600));
/// assert_eq!(config.catalog_refresh_interval(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Reconciliation sweep settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepConfig>,

    /// State catalog cache settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,

    /// Where status-change notifications go.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationConfig>,

    /// Maximum time to wait for the database lock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_lock_wait_seconds: Option<u64>,

    /// Offset from UTC used when printing instants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_offset_minutes: Option<i32>,

    /// Default output format for listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
}

/// Reconciliation sweep settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Hours between background passes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<u64>,

    /// Whether the watcher runs at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// State catalog cache settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Seconds a cached catalog is trusted before reloading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_seconds: Option<u64>,
}

/// Notification settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Which sink receives events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<SinkKind>,

    /// Outbox file for the `outbox` sink.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbox_path: Option<PathBuf>,

    /// Whether delivery happens on a worker thread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<DispatchMode>,
}

/// Bundled notification sinks selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Write events to the log.
    #[default]
    Log,
    /// Append events to a JSON-lines outbox file.
    Outbox,
    /// Drop events.
    None,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Outbox => write!(f, "outbox"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned columns for humans.
    #[default]
    Table,
    /// A JSON array.
    Json,
    /// Comma-separated values with a header row.
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl Config {
    /// Time between background sweep passes.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        self.sweep
            .as_ref()
            .and_then(|s| s.interval_hours)
            .map_or(DEFAULT_SWEEP_INTERVAL, |hours| {
                Duration::from_secs(hours.saturating_mul(3600))
            })
    }

    /// Whether the sweep watcher is enabled. Defaults to true.
    #[must_use]
    pub fn sweep_enabled(&self) -> bool {
        self.sweep.as_ref().and_then(|s| s.enabled).unwrap_or(true)
    }

    /// How long catalog entries are trusted.
    #[must_use]
    pub fn catalog_refresh_interval(&self) -> Duration {
        self.catalog
            .as_ref()
            .and_then(|c| c.refresh_seconds)
            .map_or(DEFAULT_REFRESH_INTERVAL, Duration::from_secs)
    }

    /// Database busy timeout.
    #[must_use]
    pub fn lock_wait(&self) -> Duration {
        Duration::from_secs(
            self.maximum_lock_wait_seconds
                .unwrap_or(DEFAULT_LOCK_WAIT_SECONDS),
        )
    }

    /// Offset applied when displaying instants. UTC unless configured or
    /// out of range.
    #[must_use]
    pub fn display_offset(&self) -> FixedOffset {
        self.display_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes.checked_mul(60)?))
            .unwrap_or_else(|| Utc.fix())
    }

    /// The configured sink, `log` by default.
    #[must_use]
    pub fn sink_kind(&self) -> SinkKind {
        self.notifications
            .as_ref()
            .and_then(|n| n.sink)
            .unwrap_or_default()
    }

    /// The configured dispatch mode, background by default.
    #[must_use]
    pub fn dispatch_mode(&self) -> DispatchMode {
        self.notifications
            .as_ref()
            .and_then(|n| n.mode)
            .unwrap_or_default()
    }

    /// The outbox file, `<data_dir>/outbox.jsonl` unless configured.
    #[must_use]
    pub fn outbox_path(&self, data_dir: &Path) -> PathBuf {
        self.notifications
            .as_ref()
            .and_then(|n| n.outbox_path.clone())
            .unwrap_or_else(|| data_dir.join(DEFAULT_OUTBOX_FILE_NAME))
    }

    /// The configured output format, table by default.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.unwrap_or_default()
    }
}
