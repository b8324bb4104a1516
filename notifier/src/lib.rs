//! # Notifier
//!
//! This crate turns watch events into notifications and delivers them to an
//! ntfy-compatible relay.
//!
//! ## Features
//!
//! - **Formatting**: Fixed title, priority and tags per event kind
//! - **Human Sizes**: Binary-scaled byte counts (`1.5 KB`)
//! - **Delivery**: JSON POST with a bounded timeout, failures reported not raised
//! - **Retries**: Optional fixed retry policy layered around any dispatcher
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Notifier                                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  WatchEvent ──► Formatter ──► NotificationRecord ──► Dispatcher │
//! │                    │                                    │       │
//! │                    ▼                                    ▼       │
//! │               SizeProbe                    NtfyDispatcher/Retry │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod formatter;
pub mod record;
pub mod size;

pub use config::NotifierConfig;
pub use dispatcher::{DispatchOutcome, Dispatcher, NtfyDispatcher, RetryingDispatcher};
pub use error::{NotifyError, Result};
pub use formatter::Formatter;
pub use record::{NotificationRecord, Priority};
pub use size::{FsSizeProbe, SizeProbe, format_size};
