//! Directory watcher implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info};

use crate::config::WatchConfig;
use crate::error::Result;
use crate::event::{EventTranslator, RawEvent};

/// Capacity of the channel between the notify thread and the consumer.
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Pause between attempts to queue an event while the channel is full.
const FULL_CHANNEL_BACKOFF: Duration = Duration::from_millis(10);

/// Watches one directory and forwards every change as a [`RawEvent`].
///
/// Events are produced on notify's own thread and delivered through a
/// bounded channel; no filtering happens here.
pub struct DirectoryWatcher {
    /// Watched directory configuration.
    config: WatchConfig,

    /// Internal notify watcher, present while running.
    watcher: Option<RecommendedWatcher>,

    /// Event sender.
    event_tx: mpsc::Sender<RawEvent>,

    /// Set once `stop` begins; the notify thread then stops waiting on a full channel.
    stopping: Arc<AtomicBool>,
}

impl DirectoryWatcher {
    /// Create a new directory watcher and the receiver its events arrive on.
    pub fn new(config: WatchConfig) -> (Self, mpsc::Receiver<RawEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let watcher = Self {
            config,
            watcher: None,
            event_tx,
            stopping: Arc::new(AtomicBool::new(false)),
        };

        (watcher, event_rx)
    }

    /// The configuration being watched.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Start watching the configured directory.
    pub fn start(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(()); // Already running
        }

        self.config.validate()?;

        let event_tx = self.event_tx.clone();
        let stopping = Arc::clone(&self.stopping);
        stopping.store(false, Ordering::Release);

        let mut translator = EventTranslator::new();
        translator.seed(&self.config.path, self.config.recursive);

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    for raw in translator.translate(event) {
                        debug!(kind = ?raw.kind, path = %raw.path.display(), "file event");
                        if !forward(&event_tx, &stopping, raw) {
                            break;
                        }
                    }
                }
                Err(e) => {
                    error!("Watch error: {e}");
                }
            },
        )?;

        let mode = if self.config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&self.config.path, mode)?;

        self.watcher = Some(watcher);
        info!(
            "Directory watcher started: {} (recursive: {})",
            self.config.path.display(),
            self.config.recursive
        );

        Ok(())
    }

    /// Stop watching.
    ///
    /// Returns promptly even when the event channel is full and nobody is
    /// reading it; events still waiting for room are dropped.
    pub fn stop(&mut self) {
        self.stopping.store(true, Ordering::Release);
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.config.path) {
                debug!("Unwatch failed for {}: {e}", self.config.path.display());
            }
            info!("Directory watcher stopped");
        }
    }

    /// Check if the watcher is running.
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }
}

/// Queue one event, waiting for room unless the watcher is stopping.
///
/// Returns `false` when the event was dropped and the rest of the batch should
/// be too.
fn forward(event_tx: &mpsc::Sender<RawEvent>, stopping: &AtomicBool, raw: RawEvent) -> bool {
    let mut pending = raw;
    loop {
        match event_tx.try_send(pending) {
            Ok(()) => return true,
            Err(TrySendError::Full(raw)) => {
                if stopping.load(Ordering::Acquire) {
                    debug!("Watcher stopping, dropping event for {}", raw.path.display());
                    return false;
                }
                pending = raw;
                std::thread::sleep(FULL_CHANNEL_BACKOFF);
            }
            Err(TrySendError::Closed(raw)) => {
                debug!("Event receiver closed, dropping event for {}", raw.path.display());
                return false;
            }
        }
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WatcherError;
    use crate::event::RawEventKind;
    use std::time::Instant;
    use tempfile::TempDir;

    #[test]
    fn test_watcher_creation() {
        let (watcher, _rx) = DirectoryWatcher::new(WatchConfig::new("/tmp"));
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_start_nonexistent_directory() {
        let (mut watcher, _rx) = DirectoryWatcher::new(WatchConfig::new("/nonexistent/path/12345"));

        let result = watcher.start();
        assert!(matches!(result, Err(WatcherError::DirectoryNotFound(_))));
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_start_and_stop() {
        let temp_dir = TempDir::new().unwrap();
        let (mut watcher, _rx) = DirectoryWatcher::new(WatchConfig::new(temp_dir.path()));

        watcher.start().unwrap();
        assert!(watcher.is_running());

        watcher.stop();
        assert!(!watcher.is_running());
    }

    #[tokio::test]
    async fn test_file_creation_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let (mut watcher, mut rx) = DirectoryWatcher::new(WatchConfig::new(temp_dir.path()));
        watcher.start().unwrap();

        let file = temp_dir.path().join("hello.txt");
        std::fs::write(&file, b"hello").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match rx.recv().await {
                    Some(event) if event.kind == RawEventKind::Created => break Some(event),
                    Some(_) => continue,
                    None => break None,
                }
            }
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(event.path.file_name(), file.file_name());
        assert!(!event.is_directory);

        watcher.stop();
    }

    #[test]
    fn test_stop_returns_while_channel_is_full() {
        let temp_dir = TempDir::new().unwrap();
        let (mut watcher, rx) = DirectoryWatcher::new(WatchConfig::new(temp_dir.path()));
        watcher.start().unwrap();

        for i in 0..(EVENT_CHANNEL_CAPACITY + 500) {
            std::fs::write(temp_dir.path().join(format!("burst-{i}.txt")), b"x").unwrap();
        }

        let deadline = Instant::now() + Duration::from_secs(10);
        while rx.len() < EVENT_CHANNEL_CAPACITY && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(rx.len(), EVENT_CHANNEL_CAPACITY);

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            watcher.stop();
            let _ = done_tx.send(watcher.is_running());
        });

        let still_running = done_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(!still_running);
        drop(rx);
    }

    #[test]
    fn test_forward_gives_up_when_stopping() {
        let (tx, mut rx) = mpsc::channel(1);
        let stopping = AtomicBool::new(false);

        assert!(forward(&tx, &stopping, RawEvent::created("/w/a.txt")));

        stopping.store(true, Ordering::Release);
        assert!(!forward(&tx, &stopping, RawEvent::created("/w/b.txt")));

        assert_eq!(rx.try_recv().unwrap().path, std::path::PathBuf::from("/w/a.txt"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_forward_drops_when_receiver_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        assert!(!forward(&tx, &AtomicBool::new(false), RawEvent::created("/w/a.txt")));
    }
}
