//! Bundled notification sinks.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};

use super::{NotificationSink, StatusChangeEvent};

/// Writes each event as an info-level log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, event: &StatusChangeEvent) -> Result<()> {
        log::info!(
            target: "carebook::notify",
            "reservation {} moved {} -> {} (client {}, caregiver {})",
            event.reservation,
            event.previous,
            event.status,
            event.client,
            event.caregiver
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Appends one JSON document per event to an outbox file.
///
/// The mail service tails the file; this crate never sends mail itself.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesSink {
    /// Creates a sink appending to `path`. The file is created on first use.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// The outbox path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, event: &StatusChangeEvent) -> std::result::Result<(), String> {
        let line = serde_json::to_string(event).map_err(|e| e.to_string())?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| format!("cannot open {}: {e}", self.path.display()))?;
        writeln!(file, "{line}").map_err(|e| e.to_string())
    }
}

impl NotificationSink for JsonLinesSink {
    fn deliver(&self, event: &StatusChangeEvent) -> Result<()> {
        self.append(event).map_err(|details| Error::Notification {
            reservation: event.reservation,
            details,
        })
    }

    fn name(&self) -> &'static str {
        "outbox"
    }
}

/// Keeps events in memory; can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StatusChangeEvent>>,
    fail: AtomicBool,
}

impl RecordingSink {
    /// Creates a sink that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that rejects everything.
    #[must_use]
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    /// Switches failure mode on or off.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Events accepted so far, in delivery order.
    #[must_use]
    pub fn events(&self) -> Vec<StatusChangeEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, event: &StatusChangeEvent) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Notification {
                reservation: event.reservation,
                details: "recording sink configured to fail".into(),
            });
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
