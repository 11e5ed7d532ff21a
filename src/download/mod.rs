//! Media download engine with two-phase output.
//!
//! This module streams a media URL into an [`OutputStore`], reporting
//! [`Progress`] and honouring a [`CancelToken`].
//!
//! # Features
//!
//! - Streaming downloads in bounded chunks (8 KiB by default)
//! - Cooperative cancellation checked at every chunk boundary
//! - Outputs stay hidden until committed, and are discarded on failure
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Structured error types classified by [`DownloadErrorKind`]
//!
//! # Example
//!
//! ```no_run
//! use nezumi_core::download::{
//!     CancelToken, DownloadEngine, DownloadTask, EngineConfig, FileOutputStore,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::with_store(
//!     Arc::new(FileOutputStore::new("./downloads")),
//!     EngineConfig::default(),
//! )?;
//! let task = DownloadTask::new("https://media.example.com/v.mp4").with_title("clip");
//! let outcome = engine
//!     .run(&task, &CancelToken::new(), |p| println!("{p}"))
//!     .await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod filename;
mod progress;
mod sink;
mod task;

pub use client::{HttpClient, MediaResponse};
pub use constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, DEFAULT_MIME_TYPE, MAX_CHUNK_SIZE, MAX_STEM_BYTES,
};
pub use engine::{DownloadEngine, DownloadHandle, DownloadOutcome, EngineConfig, EngineError};
pub use error::{DownloadError, DownloadErrorKind};
pub use filename::{extension_for_mime, url_digest_name, with_extension};
pub use progress::{CancelToken, Progress};
pub use sink::{FileOutputStore, OutputHandle, OutputState, OutputStore, PendingOutput, PublishedOutput};
pub use task::DownloadTask;

// Use `Result<T, DownloadError>` explicitly in function signatures; there is
// no module-local Result alias.
