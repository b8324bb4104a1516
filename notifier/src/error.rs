//! Error types for the notifier.

use thiserror::Error;

/// Result type alias for notifier operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Errors that can occur while configuring or delivering notifications.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Topic is empty or contains characters the relay rejects.
    #[error("invalid topic: {0:?}")]
    InvalidTopic(String),

    /// Server URL could not be parsed.
    #[error("invalid server url {url:?}: {reason}")]
    InvalidServer { url: String, reason: String },

    /// Extra field would overwrite a base field.
    #[error("reserved field name: {0}")]
    ReservedField(String),

    /// Relay answered with a non-success status.
    #[error("relay returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
