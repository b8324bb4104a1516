//! Process lifecycle: validate, watch, announce, wait for Ctrl-C.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use folderwatch_directory_watcher::{DirectoryWatcher, EventFilter, LifecycleEvent};
use folderwatch_notifier::{Dispatcher, Formatter, NtfyDispatcher, RetryingDispatcher};
use tracing::{info, warn};

use crate::args::Cli;
use crate::pipeline::{Pipeline, RunStats};

/// Run until Ctrl-C.
pub async fn run(cli: Cli) -> Result<RunStats> {
    run_with_shutdown(cli, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Run until `shutdown` resolves.
///
/// Configuration problems are returned before anything is watched or sent.
pub async fn run_with_shutdown<F>(cli: Cli, shutdown: F) -> Result<RunStats>
where
    F: Future<Output = ()>,
{
    let watch_config = cli.watch_config();
    let notifier_config = cli.notifier_config();

    watch_config
        .validate()
        .context("invalid watch configuration")?;
    notifier_config
        .validate()
        .context("invalid notification configuration")?;

    let ntfy = NtfyDispatcher::new(&notifier_config).context("failed to create HTTP client")?;
    let dispatcher: Arc<dyn Dispatcher> = if notifier_config.retries > 0 {
        Arc::new(RetryingDispatcher::new(
            ntfy,
            notifier_config.retries,
            notifier_config.retry_delay(),
        ))
    } else {
        Arc::new(ntfy)
    };

    let formatter = Formatter::new(&notifier_config.topic).with_click(notifier_config.click.clone());
    let pipeline = Pipeline::new(EventFilter::new(&watch_config), formatter, dispatcher);

    let (mut watcher, mut events) = DirectoryWatcher::new(watch_config.clone());
    watcher
        .start()
        .with_context(|| format!("failed to watch {}", watch_config.path.display()))?;

    info!(
        "Started monitoring. Notifications will be sent to topic: {}",
        notifier_config.topic
    );
    info!("Filters: {}", watch_config.describe_filters());

    let started_at = Instant::now();
    pipeline
        .announce(LifecycleEvent::Started {
            config: watch_config.clone(),
        })
        .await;

    let stats = pipeline.run_until(&mut events, shutdown).await;

    // Nothing reads events from here on.
    events.close();
    watcher.stop();
    info!("Monitoring stopped by user");

    let outcome = pipeline
        .announce(LifecycleEvent::Stopped {
            path: watch_config.path.clone(),
            elapsed: Some(started_at.elapsed()),
        })
        .await;
    if !outcome.is_success() {
        warn!("Stop notification was not delivered");
    }

    info!(
        delivered = stats.delivered,
        failed = stats.failed,
        filtered = stats.filtered,
        "Session summary"
    );

    Ok(stats)
}
