//! Per-download observers with rate-limited progress delivery.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::download::{DownloadHandle, DownloadOutcome, Progress};

/// Receives updates for one download.
///
/// `on_progress` is called at most once per progress interval with the
/// latest sample; intermediate samples are dropped. `on_finished` is called
/// exactly once, after the last `on_progress`.
pub trait DownloadObserver: Send + Sync {
    /// Latest progress sample.
    fn on_progress(&self, progress: Progress);

    /// Terminal state of the download.
    fn on_finished(&self, outcome: &DownloadOutcome);
}

/// Observer that logs through `tracing`.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    /// Creates an observer whose events carry `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl DownloadObserver for TracingObserver {
    fn on_progress(&self, progress: Progress) {
        info!(
            label = %self.label,
            bytes = progress.bytes_transferred,
            total = progress.total_or_unknown(),
            "{progress}"
        );
    }

    fn on_finished(&self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Completed(published) => info!(
                label = %self.label,
                location = %published.location.display(),
                size_bytes = published.size_bytes,
                "download finished"
            ),
            DownloadOutcome::Cancelled => info!(label = %self.label, "download cancelled"),
            DownloadOutcome::Failed(error) => {
                warn!(label = %self.label, error = %error, "download failed");
            }
        }
    }
}

/// Delivers samples from `progress` to `observer`, at most one per `interval`.
///
/// Returns once the sending side is gone and the last sample was delivered.
pub(crate) async fn forward_progress(
    mut progress: watch::Receiver<Option<Progress>>,
    observer: &dyn DownloadObserver,
    interval: Duration,
) {
    while progress.changed().await.is_ok() {
        let latest = *progress.borrow_and_update();
        if let Some(sample) = latest {
            observer.on_progress(sample);
        }
        tokio::time::sleep(interval).await;
    }
}

/// Wraps `handle` so that `observer` is driven until the download ends.
pub(crate) fn observe(
    handle: DownloadHandle,
    observer: Arc<dyn DownloadObserver>,
    interval: Duration,
) -> DownloadHandle {
    let cancel = handle.cancel_token();
    let progress = handle.progress();
    let forwarded = handle.progress();
    let join = tokio::spawn(async move {
        forward_progress(forwarded, observer.as_ref(), interval).await;
        let outcome = handle.outcome().await;
        observer.on_finished(&outcome);
        outcome
    });
    DownloadHandle::from_parts(cancel, progress, join)
}
