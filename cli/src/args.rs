//! Command line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use folderwatch_directory_watcher::WatchConfig;
use folderwatch_notifier::NotifierConfig;
use folderwatch_notifier::config::{DEFAULT_SERVER, DEFAULT_TIMEOUT_SECS};

/// Pause between delivery retries.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Monitor a folder and send ntfy notifications on file changes.
#[derive(Debug, Clone, Parser)]
#[command(name = "folderwatch")]
#[command(version)]
pub struct Cli {
    /// Path to the folder to monitor.
    #[arg(long)]
    pub path: PathBuf,

    /// Topic notifications are published to.
    #[arg(long)]
    pub topic: String,

    /// Comma-separated list of file extensions to monitor (e.g. .txt,.pdf,.docx).
    #[arg(long, value_name = "LIST")]
    pub extensions: Option<String>,

    /// Include directory events in notifications.
    #[arg(long)]
    pub include_directories: bool,

    /// Watch subdirectories recursively.
    #[arg(long)]
    pub recursive: bool,

    /// Notification relay URL.
    #[arg(long, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Timeout for one notification request, in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Extra delivery attempts when a notification fails.
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// URL to open when a notification is tapped.
    #[arg(long)]
    pub click: Option<String>,
}

impl Cli {
    /// Watch configuration described by the arguments.
    pub fn watch_config(&self) -> WatchConfig {
        let path = std::path::absolute(&self.path).unwrap_or_else(|_| self.path.clone());

        let config = WatchConfig::new(path)
            .include_directories(self.include_directories)
            .recursive(self.recursive);

        match &self.extensions {
            Some(list) => config.with_extension_list(list),
            None => config,
        }
    }

    /// Delivery configuration described by the arguments.
    pub fn notifier_config(&self) -> NotifierConfig {
        let config = NotifierConfig::new(&self.topic)
            .with_server(&self.server)
            .with_timeout_secs(self.timeout_secs)
            .with_retries(self.retries, RETRY_DELAY);

        match &self.click {
            Some(click) => config.with_click(click),
            None => config,
        }
    }
}
