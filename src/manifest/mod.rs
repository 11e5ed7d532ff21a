//! Manifest client: fetches the streaming manifest for a [`VideoId`].
//!
//! The client issues a single POST per call and never retries; retry policy
//! belongs to the [`pipeline`](crate::pipeline).

mod client;
mod config;
mod error;

use async_trait::async_trait;

pub use client::ManifestClient;
pub use config::{
    API_KEY_ENV, DEFAULT_CLIENT_NAME, DEFAULT_CLIENT_VERSION, DEFAULT_ENDPOINT, DEFAULT_LOCALE,
    ManifestConfig,
};
pub use error::ClientError;

use crate::catalog::PlayerResponse;
use crate::parser::VideoId;

/// Source of catalogs for the pipeline.
///
/// Implemented by [`ManifestClient`]; tests and alternate backends can supply
/// their own.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches the catalog for one video.
    async fn fetch_catalog(&self, video_id: &VideoId) -> Result<PlayerResponse, ClientError>;

    /// Endpoint description used in error messages.
    fn endpoint(&self) -> &str;
}
