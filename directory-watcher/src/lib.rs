//! # Directory Watcher
//!
//! This crate provides file system monitoring for folderwatch.
//! It watches a single directory and reports every change as a [`RawEvent`].
//!
//! ## Features
//!
//! - **Real-time Watching**: Monitor a directory, optionally recursively
//! - **Event Translation**: Map notify events onto created/modified/deleted/moved
//! - **Filtering**: Extension allow-list and directory-event toggle
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  WatchConfig ──► DirectoryWatcher ──► RawEvent                 │
//! │       │                                   │                     │
//! │       ▼                                   ▼                     │
//! │  EventFilter ◄────────────────────── consumer                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod watcher;

pub use config::WatchConfig;
pub use error::{Result, WatcherError};
pub use event::{EventTranslator, LifecycleEvent, RawEvent, RawEventKind, WatchEvent};
pub use filter::EventFilter;
pub use watcher::DirectoryWatcher;
