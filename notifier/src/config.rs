//! Configuration for notification delivery.

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, Result};

/// Default relay.
pub const DEFAULT_SERVER: &str = "https://ntfy.sh";

/// Default bound on one HTTP request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Longest topic the relay accepts.
const MAX_TOPIC_LEN: usize = 64;

/// Configuration for the notification relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Relay base URL; JSON messages are posted to it directly.
    pub server: String,

    /// Topic every notification is published to.
    pub topic: String,

    /// Timeout for a single request, in seconds.
    pub timeout_secs: u64,

    /// Extra delivery attempts after a failure.
    pub retries: u32,

    /// Pause between attempts, in milliseconds.
    pub retry_delay_ms: u64,

    /// URL opened when a notification is tapped.
    pub click: Option<String>,
}

impl NotifierConfig {
    /// Create a config for `topic` on the default relay.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            topic: topic.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: 0,
            retry_delay_ms: 1000,
            click: None,
        }
    }

    /// Set the relay URL.
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the retry count and delay.
    pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the click URL.
    pub fn with_click(mut self, click: impl Into<String>) -> Self {
        self.click = Some(click.into());
        self
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between retries as a duration.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Parsed relay URL.
    pub fn endpoint(&self) -> Result<Url> {
        let url = Url::parse(&self.server).map_err(|e| NotifyError::InvalidServer {
            url: self.server.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(NotifyError::InvalidServer {
                url: self.server.clone(),
                reason: format!("unsupported scheme {other}"),
            }),
        }
    }

    /// Check topic and server before anything is sent.
    pub fn validate(&self) -> Result<()> {
        let topic_ok = !self.topic.is_empty()
            && self.topic.len() <= MAX_TOPIC_LEN
            && self
                .topic
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !topic_ok {
            return Err(NotifyError::InvalidTopic(self.topic.clone()));
        }

        self.endpoint()?;
        Ok(())
    }
}
