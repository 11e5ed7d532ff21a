//! Nezumi Core Library
//!
//! This library turns a pasted video link into a list of stream formats and
//! downloads the one the caller picks, reporting progress along the way.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Extracts the video id from a pasted link
//! - [`catalog`] - Manifest model: formats, details, itag descriptions
//! - [`manifest`] - Fetches the manifest for a video id
//! - [`download`] - Streams a media URL into a two-phase output
//! - [`humanize`] - SI byte-count formatting
//! - [`pipeline`] - Wires the above together and throttles progress
//! - [`http`] - Shared HTTP client construction

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod download;
pub mod http;
pub mod humanize;
pub mod manifest;
pub mod parser;
pub mod pipeline;
mod user_agent;

// Re-export commonly used types
pub use catalog::{Format, ManifestError, PlayerResponse, StreamingData, VideoDetails};
pub use download::{
    CancelToken, DownloadEngine, DownloadError, DownloadErrorKind, DownloadHandle,
    DownloadOutcome, DownloadTask, EngineConfig, EngineError, FileOutputStore, HttpClient,
    OutputStore, Progress, PublishedOutput,
};
pub use humanize::human_readable;
pub use manifest::{CatalogSource, ClientError, ManifestClient, ManifestConfig};
pub use parser::{ResolutionError, VideoId, resolve};
pub use pipeline::{
    CatalogState, DownloadObserver, Pipeline, PipelineConfig, RetryPolicy, TracingObserver,
};
