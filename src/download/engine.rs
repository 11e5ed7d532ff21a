//! Download engine: streams one media body into a two-phase output.
//!
//! The engine copies the body in bounded chunks, reports progress after
//! every chunk and checks a [`CancelToken`] at every chunk boundary. Waiting
//! for the next network chunk races against cancellation, so a stalled body
//! still observes it.
//!
//! # Concurrency Model
//!
//! - Each spawned download runs in its own Tokio task
//! - A semaphore permit is acquired before the request is sent
//! - Permits are released automatically when downloads end (RAII)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nezumi_core::download::{DownloadEngine, DownloadTask, EngineConfig, FileOutputStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FileOutputStore::new("./downloads"));
//! let engine = Arc::new(DownloadEngine::with_store(store, EngineConfig::default())?);
//! let handle = engine.spawn(DownloadTask::new("https://media.example.com/v.mp4"));
//! let outcome = handle.outcome().await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

use std::pin::pin;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::client::{HttpClient, MediaResponse};
use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, MAX_CHUNK_SIZE,
    MAX_CONCURRENCY, READ_TIMEOUT_SECS,
};
use super::error::DownloadError;
use super::progress::{CancelToken, Progress};
use super::sink::{OutputHandle, OutputStore, PublishedOutput};
use super::task::DownloadTask;
use crate::http::HttpTimeouts;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Error type for download engine construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid chunk size provided.
    #[error("invalid chunk size {value}: must be between 1 and {MAX_CHUNK_SIZE}")]
    InvalidChunkSize {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The media HTTP client could not be built.
    #[error("failed to create media client: {0}")]
    Client(#[from] DownloadError),
}

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest slice written to the sink per step, in bytes.
    pub chunk_size: usize,
    /// Downloads allowed to run at once.
    pub concurrency: usize,
    /// Media client timeouts.
    pub timeouts: HttpTimeouts,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            timeouts: HttpTimeouts::from_secs(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS),
        }
    }
}

/// Terminal state of one download.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Every byte was written and the output was published.
    Completed(PublishedOutput),
    /// Cancellation was requested; nothing was published.
    Cancelled,
    /// The download stopped on an error; nothing was published.
    Failed(DownloadError),
}

impl DownloadOutcome {
    /// Returns true for [`DownloadOutcome::Completed`].
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns true for [`DownloadOutcome::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The published output, when completed.
    #[must_use]
    pub fn published(&self) -> Option<&PublishedOutput> {
        match self {
            Self::Completed(published) => Some(published),
            _ => None,
        }
    }

    /// The failure, when failed.
    #[must_use]
    pub fn error(&self) -> Option<&DownloadError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Handle to a spawned download.
///
/// Progress is published through a coalescing channel: a slow reader only
/// ever sees the latest sample.
#[derive(Debug)]
pub struct DownloadHandle {
    cancel: CancelToken,
    progress: watch::Receiver<Option<Progress>>,
    join: JoinHandle<DownloadOutcome>,
}

impl DownloadHandle {
    pub(crate) fn from_parts(
        cancel: CancelToken,
        progress: watch::Receiver<Option<Progress>>,
        join: JoinHandle<DownloadOutcome>,
    ) -> Self {
        Self {
            cancel,
            progress,
            join,
        }
    }

    /// Requests cancellation. The download ends as [`DownloadOutcome::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The token observed by the copy loop.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// A receiver for the latest progress sample. `None` until the first chunk.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<Option<Progress>> {
        self.progress.clone()
    }

    /// Waits for the terminal state.
    pub async fn outcome(self) -> DownloadOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(_) if self.cancel.is_cancelled() => DownloadOutcome::Cancelled,
            Err(error) => DownloadOutcome::Failed(DownloadError::interrupted(error.to_string())),
        }
    }
}

enum CopyEnd {
    Finished(u64),
    Cancelled,
}

/// Download engine with bounded concurrency.
pub struct DownloadEngine {
    client: HttpClient,
    store: Arc<dyn OutputStore>,
    semaphore: Arc<Semaphore>,
    chunk_size: usize,
    concurrency: usize,
}

impl std::fmt::Debug for DownloadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadEngine")
            .field("chunk_size", &self.chunk_size)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl DownloadEngine {
    /// Creates an engine over an existing media client and output store.
    ///
    /// `config.timeouts` is ignored here; the client already carries its own.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidChunkSize`] or
    /// [`EngineError::InvalidConcurrency`] when a value is out of range.
    #[instrument(level = "debug", skip(client, store))]
    pub fn new(
        client: HttpClient,
        store: Arc<dyn OutputStore>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        if !(1..=MAX_CHUNK_SIZE).contains(&config.chunk_size) {
            return Err(EngineError::InvalidChunkSize {
                value: config.chunk_size,
            });
        }
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&config.concurrency) {
            return Err(EngineError::InvalidConcurrency {
                value: config.concurrency,
            });
        }

        debug!(
            chunk_size = config.chunk_size,
            concurrency = config.concurrency,
            "creating download engine"
        );

        Ok(Self {
            client,
            store,
            semaphore: Arc::new(Semaphore::new(config.concurrency)),
            chunk_size: config.chunk_size,
            concurrency: config.concurrency,
        })
    }

    /// Creates an engine with a media client built from `config.timeouts`.
    ///
    /// # Errors
    ///
    /// Same as [`DownloadEngine::new`], plus [`EngineError::Client`] when
    /// the client cannot be built.
    pub fn with_store(store: Arc<dyn OutputStore>, config: EngineConfig) -> Result<Self, EngineError> {
        let client = HttpClient::with_timeouts(config.timeouts)?;
        Self::new(client, store, config)
    }

    /// Configured chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs `task` on the Tokio runtime and returns a handle to it.
    pub fn spawn(self: &Arc<Self>, task: DownloadTask) -> DownloadHandle {
        let cancel = CancelToken::new();
        let (progress_tx, progress_rx) = watch::channel(None);
        let engine = Arc::clone(self);
        let token = cancel.clone();
        let join = tokio::spawn(async move {
            engine
                .run(&task, &token, |sample| {
                    progress_tx.send_replace(Some(sample));
                })
                .await
        });
        DownloadHandle::from_parts(cancel, progress_rx, join)
    }

    /// Downloads `task` to completion, cancellation or failure.
    ///
    /// `on_progress` is called after every non-empty chunk with strictly
    /// increasing `bytes_transferred`. It is never called after the copy
    /// loop has observed cancellation.
    #[instrument(skip(self, cancel, on_progress), fields(url = %task.source_url()))]
    pub async fn run<F>(
        &self,
        task: &DownloadTask,
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> DownloadOutcome
    where
        F: FnMut(Progress) + Send,
    {
        let _permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return DownloadOutcome::Cancelled,
            permit = self.semaphore.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    return DownloadOutcome::Failed(DownloadError::interrupted(
                        "download engine shut down",
                    ));
                }
            },
        };

        let media = tokio::select! {
            biased;
            () = cancel.cancelled() => return DownloadOutcome::Cancelled,
            opened = self.client.open(task.source_url()) => match opened {
                Ok(media) => media,
                Err(error) => {
                    warn!(error = %error, "media request failed");
                    return DownloadOutcome::Failed(error);
                }
            },
        };
        let total_bytes = media.content_length();

        let display_name = task.display_name();
        let mut output =
            match OutputHandle::open(self.store.as_ref(), &display_name, task.target_mime_type())
                .await
            {
                Ok(output) => output,
                Err(error) => {
                    warn!(error = %error, "could not open output");
                    return DownloadOutcome::Failed(error);
                }
            };

        let copied = self
            .copy_body(media, &mut output, cancel, total_bytes, &mut on_progress)
            .await;

        match copied {
            Ok(CopyEnd::Finished(bytes)) if !cancel.is_cancelled() => {
                if let Some(expected) = total_bytes
                    && expected != bytes
                {
                    warn!(
                        expected,
                        actual = bytes,
                        "body length differs from Content-Length"
                    );
                }
                match output.commit(bytes).await {
                    Ok(published) => {
                        info!(
                            location = %published.location.display(),
                            bytes,
                            "download complete"
                        );
                        DownloadOutcome::Completed(published)
                    }
                    Err(error) => DownloadOutcome::Failed(error),
                }
            }
            Ok(CopyEnd::Finished(_) | CopyEnd::Cancelled) => {
                output.abandon().await;
                info!(display_name = %display_name, "download cancelled");
                DownloadOutcome::Cancelled
            }
            Err(error) => {
                warn!(error = %error, "download failed");
                output.abandon().await;
                DownloadOutcome::Failed(error)
            }
        }
    }

    async fn copy_body<F>(
        &self,
        media: MediaResponse,
        output: &mut OutputHandle,
        cancel: &CancelToken,
        total_bytes: Option<u64>,
        on_progress: &mut F,
    ) -> Result<CopyEnd, DownloadError>
    where
        F: FnMut(Progress) + Send,
    {
        let mut body = pin!(media.into_body());
        let mut bytes_transferred: u64 = 0;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(CopyEnd::Cancelled),
                next = body.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk?;

            for piece in chunk.chunks(self.chunk_size) {
                if cancel.is_cancelled() {
                    return Ok(CopyEnd::Cancelled);
                }
                output.write(piece).await?;
                bytes_transferred += piece.len() as u64;
                on_progress(Progress {
                    bytes_transferred,
                    total_bytes,
                });
            }
        }

        debug!(bytes_transferred, "body exhausted");
        Ok(CopyEnd::Finished(bytes_transferred))
    }
}
