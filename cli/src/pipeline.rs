//! Filter, format and dispatch for each event.

use std::future::Future;
use std::sync::Arc;

use folderwatch_directory_watcher::{EventFilter, LifecycleEvent, RawEvent, WatchEvent};
use folderwatch_notifier::{DispatchOutcome, Dispatcher, Formatter};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Consecutive failures after which each further failure is logged as an error.
const SUSTAINED_FAILURE_THRESHOLD: u64 = 5;

/// Counters for one monitoring session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Notifications the relay accepted.
    pub delivered: u64,

    /// Notifications that could not be delivered.
    pub failed: u64,

    /// Events rejected by the filter.
    pub filtered: u64,
}

/// Runs one event at a time through filter, formatter and dispatcher.
///
/// Holds no per-event state; a failed delivery affects only its own event.
pub struct Pipeline {
    filter: EventFilter,
    formatter: Formatter,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Pipeline {
    /// Create a new pipeline.
    pub fn new(filter: EventFilter, formatter: Formatter, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            filter,
            formatter,
            dispatcher,
        }
    }

    /// Handle a file system event. Returns `None` when the filter rejects it.
    pub async fn handle(&self, event: RawEvent) -> Option<DispatchOutcome> {
        if !self.filter.accept(&event) {
            debug!(kind = ?event.kind, path = %event.path.display(), "event filtered out");
            return None;
        }

        match event.dest_path() {
            Some(to) => info!("Moved: {} -> {}", event.path.display(), to.display()),
            None => info!("{:?}: {}", event.kind, event.path.display()),
        }

        Some(self.deliver(event.into()).await)
    }

    /// Announce a lifecycle change. Never filtered.
    pub async fn announce(&self, event: LifecycleEvent) -> DispatchOutcome {
        self.deliver(event.into()).await
    }

    /// Process events until `shutdown` resolves or the event stream ends.
    ///
    /// An event already being delivered when shutdown is requested is
    /// allowed to finish.
    pub async fn run_until<F>(&self, events: &mut mpsc::Receiver<RawEvent>, shutdown: F) -> RunStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut stats = RunStats::default();
        let mut consecutive_failures = 0u64;

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        warn!("Event stream closed");
                        break;
                    };

                    match self.handle(event).await {
                        None => stats.filtered += 1,
                        Some(DispatchOutcome::Success) => {
                            stats.delivered += 1;
                            consecutive_failures = 0;
                        }
                        Some(DispatchOutcome::Failure { .. }) => {
                            stats.failed += 1;
                            consecutive_failures += 1;
                            if consecutive_failures >= SUSTAINED_FAILURE_THRESHOLD {
                                error!(
                                    "{consecutive_failures} notifications in a row failed; check the relay"
                                );
                            }
                        }
                    }
                }
            }
        }

        stats
    }

    async fn deliver(&self, event: WatchEvent) -> DispatchOutcome {
        let record = self.formatter.format(&event);
        let outcome = self.dispatcher.send(&record).await;

        if let DispatchOutcome::Failure { reason } = &outcome {
            warn!(
                dispatcher = self.dispatcher.name(),
                "Failed to send notification {:?}: {reason}", record.title
            );
        }

        outcome
    }
}
