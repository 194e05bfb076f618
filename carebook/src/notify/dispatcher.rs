//! Delivery of events to a sink, inline or on a worker thread.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{NotificationSink, StatusChangeEvent};

/// How the dispatcher reaches the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Deliver on the caller's thread right after commit.
    Inline,
    /// Queue events for a dedicated worker thread.
    #[default]
    Background,
}

/// Counters of delivery outcomes.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryStats {
    /// Events the sink accepted.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Events the sink rejected or that could not be queued.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

enum Route {
    Disabled,
    Inline(Arc<dyn NotificationSink>),
    Background {
        sender: Option<Sender<StatusChangeEvent>>,
        worker: Option<JoinHandle<()>>,
    },
}

/// Forwards status-change events to a sink without ever failing the caller.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use carebook::notify::{NotificationDispatcher, RecordingSink};
///
/// let sink = Arc::new(RecordingSink::new());
/// let dispatcher = NotificationDispatcher::inline(sink.clone());
/// assert_eq!(dispatcher.stats().delivered(), 0);
/// ```
pub struct NotificationDispatcher {
    route: Route,
    stats: Arc<DeliveryStats>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("mode", &self.mode())
            .field("stats", &self.stats)
            .finish()
    }
}

impl NotificationDispatcher {
    /// Creates a dispatcher in the given mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the background worker thread cannot be spawned.
    pub fn new(mode: DispatchMode, sink: Arc<dyn NotificationSink>) -> Result<Self> {
        match mode {
            DispatchMode::Inline => Ok(Self::inline(sink)),
            DispatchMode::Background => Self::background(sink),
        }
    }

    /// Delivers on the caller's thread.
    #[must_use]
    pub fn inline(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            route: Route::Inline(sink),
            stats: Arc::default(),
        }
    }

    /// Delivers from a dedicated worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn background(sink: Arc<dyn NotificationSink>) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<StatusChangeEvent>();
        let stats = Arc::new(DeliveryStats::default());
        let worker_stats = Arc::clone(&stats);

        let worker = thread::Builder::new()
            .name("carebook-notify".into())
            .spawn(move || {
                for event in receiver {
                    deliver(sink.as_ref(), &event, &worker_stats);
                }
                log::debug!("notification worker stopped");
            })?;

        Ok(Self {
            route: Route::Background {
                sender: Some(sender),
                worker: Some(worker),
            },
            stats,
        })
    }

    /// Drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            route: Route::Disabled,
            stats: Arc::default(),
        }
    }

    /// Hands an event to the sink. Never fails.
    pub fn dispatch(&self, event: StatusChangeEvent) {
        match &self.route {
            Route::Disabled => {
                log::trace!("notifications disabled, dropping event for {}", event.reservation);
            }
            Route::Inline(sink) => deliver(sink.as_ref(), &event, &self.stats),
            Route::Background { sender, .. } => {
                let queued = sender
                    .as_ref()
                    .is_some_and(|sender| sender.send(event.clone()).is_ok());
                if !queued {
                    log::warn!(
                        "notification worker unavailable, dropping event for reservation {}",
                        event.reservation
                    );
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// How events reach the sink, or `None` when they are dropped.
    #[must_use]
    pub fn mode(&self) -> Option<DispatchMode> {
        match self.route {
            Route::Disabled => None,
            Route::Inline(_) => Some(DispatchMode::Inline),
            Route::Background { .. } => Some(DispatchMode::Background),
        }
    }

    /// Delivery counters.
    #[must_use]
    pub fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    /// Delivery counters that outlive the dispatcher.
    #[must_use]
    pub fn shared_stats(&self) -> Arc<DeliveryStats> {
        Arc::clone(&self.stats)
    }

    /// Waits for queued events to be delivered and stops the worker.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Route::Background { sender, worker } = &mut self.route {
            drop(sender.take());
            if let Some(worker) = worker.take() {
                if worker.join().is_err() {
                    log::warn!("notification worker panicked");
                }
            }
        }
    }
}

impl Drop for NotificationDispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

fn deliver(sink: &dyn NotificationSink, event: &StatusChangeEvent, stats: &DeliveryStats) {
    match catch_unwind(AssertUnwindSafe(|| sink.deliver(event))) {
        Ok(Ok(())) => {
            stats.delivered.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "{} accepted {} for reservation {}",
                sink.name(),
                event.status,
                event.reservation
            );
        }
        Ok(Err(err)) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "{} failed to deliver {} for reservation {}: {err}",
                sink.name(),
                event.status,
                event.reservation
            );
        }
        Err(_) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "{} panicked delivering {} for reservation {}",
                sink.name(),
                event.status,
                event.reservation
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingSink;
    use crate::reservation::{ReservationId, UserId};
    use crate::status::ReservationStatus;
    use chrono::Utc;

    fn event(id: i64) -> StatusChangeEvent {
        StatusChangeEvent {
            reservation: ReservationId::new(id),
            previous: ReservationStatus::Pending,
            status: ReservationStatus::Approved,
            client: UserId::new(1),
            caregiver: UserId::new(2),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_inline_delivery() {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = NotificationDispatcher::inline(sink.clone());
        assert_eq!(dispatcher.mode(), Some(DispatchMode::Inline));
        assert_eq!(NotificationDispatcher::disabled().mode(), None);

        dispatcher.dispatch(event(1));
        assert_eq!(sink.events().len(), 1);
        assert_eq!(dispatcher.stats().delivered(), 1);
        assert_eq!(dispatcher.stats().failed(), 0);
    }

    #[test]
    fn test_inline_failure_is_counted() {
        let sink = Arc::new(RecordingSink::failing());
        let dispatcher = NotificationDispatcher::inline(sink.clone());

        dispatcher.dispatch(event(1));
        assert!(sink.events().is_empty());
        assert_eq!(dispatcher.stats().failed(), 1);
    }

    #[test]
    fn test_background_delivers_in_order_before_shutdown() {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = NotificationDispatcher::background(sink.clone()).unwrap();
        assert_eq!(dispatcher.mode(), Some(DispatchMode::Background));

        for id in 1..=5 {
            dispatcher.dispatch(event(id));
        }
        dispatcher.shutdown();

        let ids: Vec<i64> = sink.events().iter().map(|e| e.reservation.value()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        struct Panicking;
        impl NotificationSink for Panicking {
            fn deliver(&self, _event: &StatusChangeEvent) -> Result<()> {
                panic!("mail server on fire");
            }
        }

        let dispatcher = NotificationDispatcher::inline(Arc::new(Panicking));
        dispatcher.dispatch(event(1));
        assert_eq!(dispatcher.stats().failed(), 1);
    }

    #[test]
    fn test_disabled_drops_events() {
        let dispatcher = NotificationDispatcher::disabled();
        dispatcher.dispatch(event(1));
        assert_eq!(dispatcher.stats().delivered(), 0);
        assert_eq!(dispatcher.stats().failed(), 0);
    }
}
