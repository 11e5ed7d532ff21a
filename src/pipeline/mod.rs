//! Pipeline orchestrator: link → catalog → chosen format → download.
//!
//! The [`Pipeline`] owns the current [`VideoId`] and publishes the catalog
//! state through a watch channel. Setting a new id cancels the fetch in
//! flight; a result that lands after a newer id was set is discarded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nezumi_core::download::{DownloadEngine, EngineConfig, FileOutputStore};
//! use nezumi_core::manifest::{ManifestClient, ManifestConfig};
//! use nezumi_core::pipeline::{CatalogState, Pipeline, PipelineConfig, TracingObserver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(ManifestClient::new(ManifestConfig::default())?);
//! let engine = Arc::new(DownloadEngine::with_store(
//!     Arc::new(FileOutputStore::new("./downloads")),
//!     EngineConfig::default(),
//! )?);
//! let pipeline = Pipeline::new(source, engine, PipelineConfig::default());
//!
//! pipeline.submit_input("https://youtu.be/dQw4w9WgXcQ")?;
//! let mut state = pipeline.subscribe();
//! state.wait_for(CatalogState::is_settled).await?;
//!
//! if let Some(format) = pipeline.formats().first() {
//!     let handle = pipeline.download(format, Arc::new(TracingObserver::new("demo")));
//!     println!("{:?}", handle.outcome().await);
//! }
//! # Ok(())
//! # }
//! ```

mod notify;
mod retry;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub use notify::{DownloadObserver, TracingObserver};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, StopReason, classify_error,
};

use crate::catalog::{Format, PlayerResponse, VideoDetails};
use crate::download::{DownloadEngine, DownloadHandle, DownloadTask};
use crate::manifest::{CatalogSource, ClientError};
use crate::parser::{ResolutionError, VideoId, resolve};

/// Default spacing between progress deliveries to an observer.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound for one catalog fetch attempt. `None` relies on the
    /// client's own HTTP timeouts.
    pub fetch_timeout: Option<Duration>,
    /// Retry policy for catalog fetches.
    pub retry_policy: RetryPolicy,
    /// Minimum spacing between progress deliveries.
    pub progress_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: None,
            retry_policy: RetryPolicy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Catalog state exposed to the UI.
#[derive(Debug, Clone, Default)]
pub enum CatalogState {
    /// No video selected yet.
    #[default]
    Idle,
    /// A fetch is running.
    Loading {
        /// Video being fetched.
        video_id: VideoId,
    },
    /// The catalog for the current video.
    Ready(Arc<PlayerResponse>),
    /// The fetch for the current video failed.
    Unavailable {
        /// Video that could not be fetched.
        video_id: VideoId,
        /// Human-readable failure.
        reason: String,
    },
}

impl CatalogState {
    /// Returns true once a fetch has produced a result, good or bad.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Unavailable { .. })
    }

    /// The catalog, when ready.
    #[must_use]
    pub fn catalog(&self) -> Option<&Arc<PlayerResponse>> {
        match self {
            Self::Ready(catalog) => Some(catalog),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct FetchSlot {
    current: Option<VideoId>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
}

/// Resolves links, fetches catalogs and starts downloads.
pub struct Pipeline {
    source: Arc<dyn CatalogSource>,
    engine: Arc<DownloadEngine>,
    config: PipelineConfig,
    state: Arc<watch::Sender<CatalogState>>,
    slot: Arc<Mutex<FetchSlot>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("endpoint", &self.source.endpoint())
            .field("engine", &self.engine)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates an idle pipeline.
    pub fn new(
        source: Arc<dyn CatalogSource>,
        engine: Arc<DownloadEngine>,
        config: PipelineConfig,
    ) -> Self {
        let (state, _) = watch::channel(CatalogState::Idle);
        Self {
            source,
            engine,
            config,
            state: Arc::new(state),
            slot: Arc::new(Mutex::new(FetchSlot::default())),
        }
    }

    /// Resolves `raw_input` and makes it the current video.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the input is not a recognised link;
    /// the current video is left unchanged.
    pub fn submit_input(&self, raw_input: &str) -> Result<VideoId, ResolutionError> {
        let video_id = resolve(raw_input)?;
        self.set_video_id(video_id.clone());
        Ok(video_id)
    }

    /// Makes `video_id` the current video and starts fetching its catalog.
    ///
    /// Setting the id already loading or shown is a no-op. Must be called
    /// from within a Tokio runtime.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub fn set_video_id(&self, video_id: VideoId) {
        let mut slot = self.lock_slot();
        let failed_before = matches!(&*self.state.borrow(), CatalogState::Unavailable { .. });
        if slot.current.as_ref() == Some(&video_id) && !failed_before {
            debug!("video already current; not fetching again");
            return;
        }

        slot.generation += 1;
        let generation = slot.generation;
        if let Some(previous) = slot.in_flight.take() {
            debug!("aborting superseded catalog fetch");
            previous.abort();
        }
        slot.current = Some(video_id.clone());
        self.state.send_replace(CatalogState::Loading {
            video_id: video_id.clone(),
        });

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let shared_slot = Arc::clone(&self.slot);
        let config = self.config.clone();
        slot.in_flight = Some(tokio::spawn(async move {
            let result = fetch_with_retry(source.as_ref(), &video_id, &config).await;
            publish_result(&state, &shared_slot, generation, video_id, result);
        }));
    }

    /// A receiver for catalog state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }

    /// Snapshot of the catalog state.
    #[must_use]
    pub fn state(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    /// Current video id, if one was set.
    #[must_use]
    pub fn current_video_id(&self) -> Option<VideoId> {
        self.lock_slot().current.clone()
    }

    /// Details of the current video, once its catalog is ready.
    #[must_use]
    pub fn video_details(&self) -> Option<VideoDetails> {
        self.state
            .borrow()
            .catalog()
            .map(|catalog| catalog.video_details.clone())
    }

    /// Muxed then adaptive formats of the current catalog; empty until ready.
    #[must_use]
    pub fn formats(&self) -> Vec<Format> {
        self.state
            .borrow()
            .catalog()
            .map(|catalog| catalog.all_formats())
            .unwrap_or_default()
    }

    /// The download engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<DownloadEngine> {
        &self.engine
    }

    /// Downloads `format`, reporting to `observer`.
    ///
    /// The title comes from the current catalog when it is ready. Progress
    /// reaches the observer at most once per `progress_interval`, followed
    /// by exactly one `on_finished`.
    #[instrument(skip(self, format, observer), fields(itag = format.itag))]
    pub fn download(
        &self,
        format: &Format,
        observer: Arc<dyn DownloadObserver>,
    ) -> DownloadHandle {
        let mut task = DownloadTask::new(&format.url).with_mime_type(format.mime_type());
        if let Some(details) = self.video_details() {
            task = task.with_title(details.title);
        }
        info!(display_name = %task.display_name(), "starting download");
        let handle = self.engine.spawn(task);
        notify::observe(handle, observer, self.config.progress_interval)
    }

    fn lock_slot(&self) -> MutexGuard<'_, FetchSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Some(in_flight) = self.lock_slot().in_flight.take() {
            in_flight.abort();
        }
    }
}

fn publish_result(
    state: &watch::Sender<CatalogState>,
    slot: &Mutex<FetchSlot>,
    generation: u64,
    video_id: VideoId,
    result: Result<PlayerResponse, ClientError>,
) {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.generation != generation {
        debug!(video_id = %video_id, "discarding stale catalog result");
        return;
    }
    slot.in_flight = None;
    match result {
        Ok(catalog) => {
            info!(
                video_id = %video_id,
                formats = catalog.all_formats().len(),
                "catalog ready"
            );
            state.send_replace(CatalogState::Ready(Arc::new(catalog)));
        }
        Err(error) => {
            warn!(video_id = %video_id, error = %error, "catalog unavailable");
            state.send_replace(CatalogState::Unavailable {
                video_id,
                reason: error.to_string(),
            });
        }
    }
}

async fn fetch_with_retry(
    source: &dyn CatalogSource,
    video_id: &VideoId,
    config: &PipelineConfig,
) -> Result<PlayerResponse, ClientError> {
    let mut attempt = 1;
    loop {
        let result = match config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, source.fetch_catalog(video_id))
                .await
                .unwrap_or_else(|_| Err(ClientError::timed_out(source.endpoint()))),
            None => source.fetch_catalog(video_id).await,
        };

        let error = match result {
            Ok(catalog) => return Ok(catalog),
            Err(error) => error,
        };

        match config
            .retry_policy
            .should_retry(classify_error(&error), attempt)
        {
            RetryDecision::Retry {
                delay,
                attempt: next,
            } => {
                warn!(
                    video_id = %video_id,
                    attempt,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "catalog fetch failed; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt = next;
            }
            RetryDecision::DoNotRetry { reason } => {
                debug!(video_id = %video_id, attempt, reason = %reason, "not retrying");
                return Err(error);
            }
        }
    }
}
