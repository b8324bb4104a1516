//! Events produced by directory watching.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::WatchConfig;

/// An unprocessed file system change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// The kind of event.
    pub kind: RawEventKind,

    /// Path to the affected file or directory.
    pub path: PathBuf,

    /// Whether the affected entry is a directory.
    pub is_directory: bool,

    /// When the watcher observed the change.
    pub timestamp: DateTime<Utc>,
}

impl RawEvent {
    /// Create a new file event stamped with the current time.
    pub fn new(kind: RawEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            is_directory: false,
            timestamp: Utc::now(),
        }
    }

    /// Create a created event.
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(RawEventKind::Created, path)
    }

    /// Create a modified event.
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(RawEventKind::Modified, path)
    }

    /// Create a deleted event.
    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(RawEventKind::Deleted, path)
    }

    /// Create a moved event from `from` to `to`.
    pub fn moved(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self::new(RawEventKind::Moved { to: to.into() }, from)
    }

    /// Mark the event as concerning a directory.
    pub fn directory(mut self) -> Self {
        self.is_directory = true;
        self
    }

    /// Override the event timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Destination path; only moves have one.
    pub fn dest_path(&self) -> Option<&Path> {
        match &self.kind {
            RawEventKind::Moved { to } => Some(to),
            _ => None,
        }
    }
}

/// Kind of file event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEventKind {
    /// Entry was created (or moved into the watched tree).
    Created,

    /// Entry content was modified.
    Modified,

    /// Entry was deleted (or moved out of the watched tree).
    Deleted,

    /// Entry was moved or renamed within the watched tree.
    Moved {
        /// New location.
        to: PathBuf,
    },
}

/// Synthetic events emitted by the process lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Monitoring has begun.
    Started {
        /// Watched configuration, used to describe the filters in effect.
        config: WatchConfig,
    },

    /// Monitoring has ended.
    Stopped {
        /// Watched path.
        path: PathBuf,

        /// How long monitoring ran, when tracked.
        elapsed: Option<Duration>,
    },
}

/// Everything that can be turned into a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file system change.
    Fs(RawEvent),

    /// A lifecycle marker.
    Lifecycle(LifecycleEvent),
}

impl From<RawEvent> for WatchEvent {
    fn from(event: RawEvent) -> Self {
        Self::Fs(event)
    }
}

impl From<LifecycleEvent> for WatchEvent {
    fn from(event: LifecycleEvent) -> Self {
        Self::Lifecycle(event)
    }
}

/// Translates notify events into raw events.
///
/// Rename halves carry no file-kind hint, and an entry that has left the tree
/// can no longer be inspected. The translator remembers which paths were
/// directories so those events still report `is_directory` correctly.
#[derive(Debug, Default)]
pub struct EventTranslator {
    known_dirs: HashSet<PathBuf>,
}

impl EventTranslator {
    /// Create a translator that knows no directories yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the directories currently below `root`.
    pub fn seed(&mut self, root: &Path, recursive: bool) {
        let walker = if recursive {
            WalkDir::new(root).min_depth(1)
        } else {
            WalkDir::new(root).min_depth(1).max_depth(1)
        };

        self.known_dirs.extend(
            walker
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_dir())
                .map(walkdir::DirEntry::into_path),
        );
    }

    /// Whether `path` is remembered as a directory.
    pub fn is_known_dir(&self, path: &Path) -> bool {
        self.known_dirs.contains(path)
    }

    /// Translate one notify event.
    ///
    /// Access and metadata-only changes produce nothing.
    pub fn translate(&mut self, event: notify::Event) -> Vec<RawEvent> {
        let events = self.classify(event);
        for event in &events {
            self.remember(event);
        }
        events
    }

    fn classify(&self, event: notify::Event) -> Vec<RawEvent> {
        use notify::EventKind;

        let paths = event.paths;

        match event.kind {
            EventKind::Create(create) => {
                let dir_hint = match create {
                    CreateKind::Folder => Some(true),
                    CreateKind::File => Some(false),
                    _ => None,
                };
                paths
                    .into_iter()
                    .map(|path| self.with_dir_hint(RawEvent::created(path), dir_hint))
                    .collect()
            }
            EventKind::Remove(remove) => {
                let dir_hint = match remove {
                    RemoveKind::Folder => Some(true),
                    RemoveKind::File => Some(false),
                    _ => None,
                };
                paths
                    .into_iter()
                    .map(|path| self.with_dir_hint(RawEvent::deleted(path), dir_hint))
                    .collect()
            }
            EventKind::Modify(ModifyKind::Name(mode)) => self.from_rename(mode, paths),
            EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            EventKind::Modify(_) => paths
                .into_iter()
                .map(|path| self.with_dir_hint(RawEvent::modified(path), None))
                .collect(),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
        }
    }

    fn from_rename(&self, mode: RenameMode, paths: Vec<PathBuf>) -> Vec<RawEvent> {
        match mode {
            RenameMode::Both => {
                let mut paths = paths.into_iter();
                match (paths.next(), paths.next()) {
                    (Some(from), Some(to)) => {
                        vec![self.with_dir_hint(RawEvent::moved(from, to), None)]
                    }
                    (Some(only), None) => vec![self.from_lone_rename(only)],
                    _ => Vec::new(),
                }
            }
            RenameMode::From => paths
                .into_iter()
                .map(|path| self.with_dir_hint(RawEvent::deleted(path), None))
                .collect(),
            RenameMode::To => paths
                .into_iter()
                .map(|path| self.with_dir_hint(RawEvent::created(path), None))
                .collect(),
            RenameMode::Any | RenameMode::Other => paths
                .into_iter()
                .map(|path| self.from_lone_rename(path))
                .collect(),
        }
    }

    /// A rename with a single path: it arrived if it exists now, otherwise it left.
    fn from_lone_rename(&self, path: PathBuf) -> RawEvent {
        let event = if path.exists() {
            RawEvent::created(path)
        } else {
            RawEvent::deleted(path)
        };
        self.with_dir_hint(event, None)
    }

    fn with_dir_hint(&self, mut event: RawEvent, hint: Option<bool>) -> RawEvent {
        event.is_directory = match hint {
            Some(is_dir) => is_dir,
            None => {
                let current = event.dest_path().unwrap_or(&event.path);
                if current.exists() {
                    current.is_dir()
                } else {
                    self.is_known_dir(current) || self.is_known_dir(&event.path)
                }
            }
        };
        event
    }

    fn remember(&mut self, event: &RawEvent) {
        match &event.kind {
            RawEventKind::Created | RawEventKind::Modified if event.is_directory => {
                self.known_dirs.insert(event.path.clone());
            }
            RawEventKind::Deleted => self.forget(&event.path),
            RawEventKind::Moved { to } => {
                self.forget(&event.path);
                if event.is_directory {
                    self.known_dirs.insert(to.clone());
                }
            }
            _ => {}
        }
    }

    /// Drop `path` and everything below it.
    fn forget(&mut self, path: &Path) {
        self.known_dirs.retain(|dir| !dir.starts_with(path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use notify::event::DataChange;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn translate(event: notify::Event) -> Vec<RawEvent> {
        EventTranslator::new().translate(event)
    }

    fn notify_event(kind: EventKind, paths: &[&str]) -> notify::Event {
        paths
            .iter()
            .fold(notify::Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    #[test]
    fn test_moved_event_has_destination() {
        let event = RawEvent::moved("/a/old.txt", "/a/new.txt");
        assert_eq!(event.dest_path(), Some(Path::new("/a/new.txt")));
        assert_eq!(RawEvent::created("/a/x").dest_path(), None);
    }

    #[test]
    fn test_create_folder_hint() {
        let events = translate(notify_event(
            EventKind::Create(CreateKind::Folder),
            &["/gone/dir"],
        ));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, RawEventKind::Created);
        assert!(events[0].is_directory);
    }

    #[test]
    fn test_remove_file() {
        let events = translate(notify_event(
            EventKind::Remove(RemoveKind::File),
            &["/gone/file.txt"],
        ));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, RawEventKind::Deleted);
        assert!(!events[0].is_directory);
    }

    #[test]
    fn test_data_change_is_modified() {
        let events = translate(notify_event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/gone/file.txt"],
        ));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, RawEventKind::Modified);
    }

    #[test]
    fn test_rename_both_is_moved() {
        let events = translate(notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/w/a.txt", "/w/sub/a.txt"],
        ));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path, PathBuf::from("/w/a.txt"));
        assert_eq!(events[0].dest_path(), Some(Path::new("/w/sub/a.txt")));
    }

    #[test]
    fn test_rename_halves() {
        let out = translate(notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/w/a.txt"],
        ));
        assert_eq!(out[0].kind, RawEventKind::Deleted);

        let into = translate(notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/w/a.txt"],
        ));
        assert_eq!(into[0].kind, RawEventKind::Created);
    }

    #[test]
    fn test_rename_any_checks_existence() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("here.txt");
        std::fs::write(&present, b"x").unwrap();
        let absent = temp_dir.path().join("gone.txt");

        let events = translate(
            notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any)))
                .add_path(present)
                .add_path(absent),
        );

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, RawEventKind::Created);
        assert_eq!(events[1].kind, RawEventKind::Deleted);
    }

    #[test]
    fn test_access_and_metadata_dropped() {
        use notify::event::{AccessKind, MetadataKind};

        assert!(translate(notify_event(EventKind::Access(AccessKind::Any), &["/x"])).is_empty());
        assert!(
            translate(notify_event(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)),
                &["/x"],
            ))
            .is_empty()
        );
    }

    #[test]
    fn test_directory_moved_out_is_still_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("photos");
        std::fs::create_dir(&dir).unwrap();

        let mut translator = EventTranslator::new();
        translator.seed(temp_dir.path(), false);
        assert!(translator.is_known_dir(&dir));

        std::fs::remove_dir(&dir).unwrap();
        let events = translator.translate(notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &[dir.to_str().unwrap()],
        ));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, RawEventKind::Deleted);
        assert!(events[0].is_directory);
        assert!(!translator.is_known_dir(&dir));
    }

    #[test]
    fn test_directories_are_learned_from_events() {
        let mut translator = EventTranslator::new();

        translator.translate(notify_event(
            EventKind::Create(CreateKind::Folder),
            &["/w/new_dir"],
        ));
        assert!(translator.is_known_dir(Path::new("/w/new_dir")));

        let moved = translator.translate(notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/w/new_dir", "/elsewhere/new_dir"],
        ));
        assert!(moved[0].is_directory);
        assert!(!translator.is_known_dir(Path::new("/w/new_dir")));
        assert!(translator.is_known_dir(Path::new("/elsewhere/new_dir")));

        let gone = translator.translate(notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
            &["/elsewhere/new_dir"],
        ));
        assert_eq!(gone[0].kind, RawEventKind::Deleted);
        assert!(gone[0].is_directory);
    }

    #[test]
    fn test_seed_respects_recursion() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let mut shallow = EventTranslator::new();
        shallow.seed(temp_dir.path(), false);
        assert!(shallow.is_known_dir(&temp_dir.path().join("a")));
        assert!(!shallow.is_known_dir(&nested));

        let mut deep = EventTranslator::new();
        deep.seed(temp_dir.path(), true);
        assert!(deep.is_known_dir(&nested));
    }
}
