//! Turns watch events into notification records.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use folderwatch_directory_watcher::{LifecycleEvent, RawEvent, RawEventKind, WatchEvent};
use tracing::warn;

use crate::record::{NotificationRecord, Priority};
use crate::size::{FsSizeProbe, SizeProbe, format_size};

/// Placeholder for anything that cannot be determined.
const UNKNOWN: &str = "unknown";

/// Builds a [`NotificationRecord`] for every event. Never fails.
#[derive(Clone)]
pub struct Formatter {
    topic: String,
    click: Option<String>,
    probe: Arc<dyn SizeProbe>,
}

impl Formatter {
    /// Create a formatter publishing to `topic`, reading sizes from disk.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            click: None,
            probe: Arc::new(FsSizeProbe),
        }
    }

    /// Attach a click URL to every record.
    pub fn with_click(mut self, click: Option<String>) -> Self {
        self.click = click;
        self
    }

    /// Use a different size source.
    pub fn with_probe(mut self, probe: Arc<dyn SizeProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Format any watch event.
    pub fn format(&self, event: &WatchEvent) -> NotificationRecord {
        let mut record = match event {
            WatchEvent::Fs(raw) => self.format_raw(raw),
            WatchEvent::Lifecycle(lifecycle) => self.format_lifecycle(lifecycle),
        };

        if let Some(click) = &self.click {
            if let Err(e) = record.insert_extra("click", click.as_str()) {
                warn!("Click URL not attached: {e}");
            }
        }

        record
    }

    fn format_raw(&self, event: &RawEvent) -> NotificationRecord {
        let noun = if event.is_directory { "Directory" } else { "File" };
        let name = file_name(&event.path);
        let location = display_path(&event.path);
        let time = format_time(event.timestamp);

        match &event.kind {
            RawEventKind::Created => NotificationRecord::new(
                &self.topic,
                "File Created",
                format!(
                    "{noun} created: {name}\nLocation: {location}\nSize: {}\nTime: {time}",
                    self.size_label(event)
                ),
                Priority::Default,
            )
            .with_tags(["file_folder", "new"]),
            RawEventKind::Modified => NotificationRecord::new(
                &self.topic,
                "File Modified",
                format!(
                    "{noun} modified: {name}\nLocation: {location}\nSize: {}\nTime: {time}",
                    self.size_label(event)
                ),
                Priority::Low,
            )
            .with_tags(["pencil"]),
            RawEventKind::Deleted => NotificationRecord::new(
                &self.topic,
                "File Deleted",
                format!("{noun} deleted: {name}\nLocation: {location}\nTime: {time}"),
                Priority::High,
            )
            .with_tags(["wastebasket", "warning"]),
            RawEventKind::Moved { to } => {
                let mut message =
                    format!("{noun} moved: {location} → {}", display_path(to));
                if event.path.parent() == to.parent() {
                    message.push_str(&format!("\nRenamed: {name} → {}", file_name(to)));
                }
                message.push_str(&format!("\nTime: {time}"));

                NotificationRecord::new(&self.topic, "File Moved", message, Priority::Default)
                    .with_tags(["arrow_right"])
            }
        }
    }

    fn format_lifecycle(&self, event: &LifecycleEvent) -> NotificationRecord {
        match event {
            LifecycleEvent::Started { config } => NotificationRecord::new(
                &self.topic,
                "Monitoring Started",
                format!(
                    "Started monitoring {}\nFilters: {}",
                    display_path(&config.path),
                    config.describe_filters()
                ),
                Priority::Default,
            )
            .with_tags(["rocket"]),
            LifecycleEvent::Stopped { path, elapsed } => {
                let mut message = format!("Stopped monitoring {}", display_path(path));
                if let Some(elapsed) = elapsed {
                    message.push_str(&format!("\nDuration: {}", format_duration(*elapsed)));
                }

                NotificationRecord::new(&self.topic, "Monitoring Stopped", message, Priority::Default)
                    .with_tags(["stop_sign"])
            }
        }
    }

    fn size_label(&self, event: &RawEvent) -> String {
        if event.is_directory {
            return "N/A (directory)".to_string();
        }

        self.probe
            .size_of(&event.path)
            .map_or_else(|| UNKNOWN.to_string(), format_size)
    }
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("topic", &self.topic)
            .field("click", &self.click)
            .finish_non_exhaustive()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| UNKNOWN.to_string(), |n| n.to_string_lossy().into_owned())
}

fn display_path(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        UNKNOWN.to_string()
    } else {
        path.display().to_string()
    }
}

fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Render a duration as e.g. `1h 2m 3s`, omitting leading zero units.
fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
