//! Eligibility filter applied before an event becomes a notification.

use std::collections::BTreeSet;
use std::path::Path;

use crate::config::WatchConfig;
use crate::event::RawEvent;

/// Decides whether a raw event should produce a notification.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    allowed_extensions: BTreeSet<String>,
    include_directories: bool,
}

impl EventFilter {
    /// Build a filter from the watch configuration.
    pub fn new(config: &WatchConfig) -> Self {
        Self {
            allowed_extensions: config.allowed_extensions.clone(),
            include_directories: config.include_directories,
        }
    }

    /// Check whether the event is eligible.
    pub fn accept(&self, event: &RawEvent) -> bool {
        if event.is_directory {
            return self.include_directories;
        }

        if self.allowed_extensions.is_empty() {
            return true;
        }

        // Moves are judged by where the file ended up.
        let extension = event
            .dest_path()
            .and_then(dotted_extension)
            .or_else(|| dotted_extension(&event.path));

        extension.is_some_and(|ext| self.allowed_extensions.contains(&ext))
    }
}

/// The extension of `path` with its leading dot, e.g. `.txt`.
fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txt_only() -> EventFilter {
        EventFilter::new(&WatchConfig::new("/a").allow_extension(".txt"))
    }

    #[test]
    fn test_extension_allow_list() {
        let filter = txt_only();

        assert!(!filter.accept(&RawEvent::created("/a/b/report.pdf")));
        assert!(filter.accept(&RawEvent::created("/a/b/notes.txt")));
    }

    #[test]
    fn test_empty_allow_list_accepts_all() {
        let filter = EventFilter::new(&WatchConfig::new("/a"));

        assert!(filter.accept(&RawEvent::created("/a/b/report.pdf")));
        assert!(filter.accept(&RawEvent::created("/a/b/notes.txt")));
        assert!(filter.accept(&RawEvent::deleted("/a/b/Makefile")));
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        assert!(!txt_only().accept(&RawEvent::modified("/a/NOTES.TXT")));
    }

    #[test]
    fn test_no_extension_rejected_by_allow_list() {
        assert!(!txt_only().accept(&RawEvent::created("/a/Makefile")));
        assert!(!txt_only().accept(&RawEvent::created("/a/.txt")));
    }

    #[test]
    fn test_directory_events() {
        let excluded = EventFilter::new(&WatchConfig::new("/a").allow_extension(".txt"));
        let included = EventFilter::new(
            &WatchConfig::new("/a")
                .allow_extension(".txt")
                .include_directories(true),
        );
        let event = RawEvent::created("/a/folder.d").directory();

        assert!(!excluded.accept(&event));
        assert!(included.accept(&event));
    }

    #[test]
    fn test_move_uses_destination_extension() {
        let filter = txt_only();

        assert!(filter.accept(&RawEvent::moved("/a/draft.tmp", "/a/final.txt")));
        assert!(!filter.accept(&RawEvent::moved("/a/final.txt", "/a/final.pdf")));
    }

    #[test]
    fn test_move_falls_back_to_source_extension() {
        assert!(txt_only().accept(&RawEvent::moved("/a/notes.txt", "/a/NOTES")));
    }
}
