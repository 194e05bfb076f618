//! Reconciliation sweep.
//!
//! Approved reservations whose date range has elapsed are moved to
//! Completed. Each reservation goes through the engine's regular transition
//! path, so the compare-and-swap guard applies and a reservation cancelled
//! between the scan and the write is skipped rather than overwritten. A
//! failure on one reservation never stops the batch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::DEFAULT_REFRESH_INTERVAL;
use crate::config::Config;
use crate::database::DatabaseConfig;
use crate::engine::ReservationEngine;
use crate::error::{Error, ErrorKind, Result};
use crate::notify::{DispatchMode, NotificationDispatcher, NotificationSink};
use crate::reservation::ReservationId;

/// Default time between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// A reservation the sweep could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    /// The reservation.
    pub reservation: ReservationId,
    /// Stable error classification.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Reservations moved to Completed.
    pub completed: Vec<ReservationId>,
    /// Reservations whose status changed before the sweep reached them.
    pub skipped: Vec<ReservationId>,
    /// Reservations that failed for any other reason.
    pub failed: Vec<SweepFailure>,
}

impl SweepReport {
    /// Number of reservations the pass looked at.
    #[must_use]
    pub fn examined(&self) -> usize {
        self.completed.len() + self.skipped.len() + self.failed.len()
    }

    /// Whether nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Settings for a background sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    /// Time between passes.
    pub interval: Duration,
    /// Catalog refresh interval of the sweep's engine.
    pub catalog_refresh: Duration,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            catalog_refresh: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl SweepSettings {
    /// Reads `sweep.interval_hours` and `catalog.refresh_seconds`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.sweep_interval(),
            catalog_refresh: config.catalog_refresh_interval(),
        }
    }
}

/// The periodic pass that completes elapsed approved reservations.
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationSweep;

impl ReconciliationSweep {
    /// Runs one pass as of `now`.
    ///
    /// Running twice with the same `now` is a no-op the second time.
    ///
    /// # Errors
    ///
    /// Returns an error only if the initial scan fails. Per-reservation
    /// failures are recorded in the report.
    pub fn run(engine: &mut ReservationEngine, now: DateTime<Utc>) -> Result<SweepReport> {
        let candidates = engine.elapsed_approved(now)?;
        let mut report = SweepReport::default();

        for reservation in candidates {
            let id = reservation.id();
            match engine.complete(id, now) {
                Ok(_) => report.completed.push(id),
                Err(Error::InvalidTransition { current, .. }) => {
                    log::info!("sweep skipped reservation {id}: now {current}");
                    report.skipped.push(id);
                }
                Err(Error::NotFound { .. }) => {
                    log::info!("sweep skipped reservation {id}: no longer exists");
                    report.skipped.push(id);
                }
                Err(err) => {
                    log::warn!("sweep failed to complete reservation {id}: {err}");
                    report.failed.push(SweepFailure {
                        reservation: id,
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                }
            }
        }

        log::info!(
            "sweep at {now}: {} completed, {} skipped, {} failed",
            report.completed.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Runs the sweep on a dedicated thread with its own connection, once
    /// immediately and then every `settings.interval`, until stopped.
    ///
    /// Notifications are delivered by a background dispatcher owned by the
    /// thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned. Errors opening the
    /// database are logged by the thread, which then exits.
    pub fn spawn(
        db_config: DatabaseConfig,
        settings: SweepSettings,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<SweepHandle> {
        let (stop, stopped) = mpsc::channel::<()>();
        let passes = Arc::new(AtomicU64::new(0));
        let thread_passes = Arc::clone(&passes);

        let worker = thread::Builder::new()
            .name("carebook-sweep".into())
            .spawn(move || {
                let mut engine = match NotificationDispatcher::new(DispatchMode::Background, sink)
                    .and_then(|notifier| ReservationEngine::open(db_config, notifier))
                {
                    Ok(engine) => engine.with_catalog_refresh(settings.catalog_refresh),
                    Err(err) => {
                        log::error!("sweep thread could not start: {err}");
                        return;
                    }
                };

                loop {
                    if let Err(err) = Self::run(&mut engine, Utc::now()) {
                        log::warn!("sweep pass failed: {err}");
                    }
                    thread_passes.fetch_add(1, Ordering::SeqCst);

                    match stopped.recv_timeout(settings.interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                engine.shutdown();
                log::debug!("sweep thread stopped");
            })?;

        Ok(SweepHandle {
            stop,
            worker,
            passes,
        })
    }
}

/// Handle to a background sweep.
#[derive(Debug)]
pub struct SweepHandle {
    stop: Sender<()>,
    worker: JoinHandle<()>,
    passes: Arc<AtomicU64>,
}

impl SweepHandle {
    /// Number of passes finished so far.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// Whether the sweep thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Signals the thread and waits for it to exit.
    pub fn stop(self) {
        // The thread may already be gone
        let _ = self.stop.send(());
        if self.worker.join().is_err() {
            log::warn!("sweep thread panicked");
        }
    }
}
