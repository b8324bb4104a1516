//! Notification delivery.
//!
//! [`NtfyDispatcher`] posts one JSON message per record. Failures are returned
//! as [`DispatchOutcome::Failure`] so the caller can log them and move on.
//! [`RetryingDispatcher`] wraps any dispatcher with a fixed retry policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::NotifierConfig;
use crate::error::{NotifyError, Result};
use crate::record::NotificationRecord;

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The relay accepted the notification.
    Success,

    /// Delivery failed; `reason` holds the status code or error text.
    Failure { reason: String },
}

impl DispatchOutcome {
    /// Whether the relay accepted the notification.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<Result<()>> for DispatchOutcome {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(e) => Self::Failure {
                reason: e.to_string(),
            },
        }
    }
}

/// Trait for notification delivery.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Name of this dispatcher, for logs.
    fn name(&self) -> &str;

    /// Deliver one record.
    async fn send(&self, record: &NotificationRecord) -> DispatchOutcome;
}

/// Publishes records to an ntfy-compatible relay as JSON.
#[derive(Debug, Clone)]
pub struct NtfyDispatcher {
    /// Relay URL.
    endpoint: Url,

    /// HTTP client, reused for every request.
    client: reqwest::Client,

    /// Per-request timeout, in seconds, for error messages.
    timeout_secs: u64,
}

impl NtfyDispatcher {
    /// Create a dispatcher from a validated config.
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            endpoint,
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    /// The URL records are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, record: &NotificationRecord) -> Result<()> {
        let body = record.to_json()?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout(self.timeout_secs)
                } else {
                    NotifyError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Dispatcher for NtfyDispatcher {
    fn name(&self) -> &str {
        "ntfy"
    }

    async fn send(&self, record: &NotificationRecord) -> DispatchOutcome {
        let outcome = DispatchOutcome::from(self.post(record).await);
        if outcome.is_success() {
            debug!("Notification sent: {}", record.title);
        }
        outcome
    }
}

/// Retries a failed delivery a fixed number of times.
pub struct RetryingDispatcher<D> {
    inner: D,
    retries: u32,
    delay: Duration,
}

impl<D: Dispatcher> RetryingDispatcher<D> {
    /// Wrap `inner`, allowing `retries` extra attempts spaced by `delay`.
    pub fn new(inner: D, retries: u32, delay: Duration) -> Self {
        Self {
            inner,
            retries,
            delay,
        }
    }

    /// The wrapped dispatcher.
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: Dispatcher> Dispatcher for RetryingDispatcher<D> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, record: &NotificationRecord) -> DispatchOutcome {
        let mut outcome = self.inner.send(record).await;

        for attempt in 1..=self.retries {
            let DispatchOutcome::Failure { reason } = &outcome else {
                break;
            };
            warn!(
                "Delivery of {:?} failed ({reason}), retry {attempt}/{}",
                record.title, self.retries
            );
            tokio::time::sleep(self.delay).await;
            outcome = self.inner.send(record).await;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Priority;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Fails a set number of times, then succeeds.
    struct Flaky {
        failures_left: Mutex<u32>,
        calls: Mutex<u32>,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures_left: Mutex::new(failures),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Dispatcher for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn send(&self, _record: &NotificationRecord) -> DispatchOutcome {
            *self.calls.lock().unwrap() += 1;
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                DispatchOutcome::Failure {
                    reason: "relay returned status 503: busy".to_string(),
                }
            } else {
                DispatchOutcome::Success
            }
        }
    }

    fn record() -> NotificationRecord {
        NotificationRecord::new("alerts", "File Created", "x", Priority::Default)
    }

    #[test]
    fn test_outcome_from_result() {
        assert_eq!(DispatchOutcome::from(Ok(())), DispatchOutcome::Success);

        let outcome = DispatchOutcome::from(Err(NotifyError::Status {
            status: 500,
            body: "boom".to_string(),
        }));
        assert_eq!(
            outcome,
            DispatchOutcome::Failure {
                reason: "relay returned status 500: boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let retrying = RetryingDispatcher::new(Flaky::new(2), 3, Duration::ZERO);

        assert_eq!(retrying.send(&record()).await, DispatchOutcome::Success);
        assert_eq!(retrying.inner().calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let retrying = RetryingDispatcher::new(Flaky::new(5), 1, Duration::ZERO);

        assert!(!retrying.send(&record()).await.is_success());
        assert_eq!(retrying.inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_on_success() {
        let retrying = RetryingDispatcher::new(Flaky::new(0), 3, Duration::ZERO);

        assert!(retrying.send(&record()).await.is_success());
        assert_eq!(retrying.inner().calls(), 1);
    }

    #[test]
    fn test_dispatcher_rejects_bad_server() {
        let config = NotifierConfig::new("alerts").with_server("::nope::");
        assert!(matches!(
            NtfyDispatcher::new(&config),
            Err(NotifyError::InvalidServer { .. })
        ));
    }
}
