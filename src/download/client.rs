//! HTTP client wrapper for fetching media bodies.
//!
//! This module provides the `HttpClient` struct which opens streaming GET
//! requests with download timeouts and maps failures to [`DownloadError`].

use futures_util::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::http::{HttpTimeouts, ReadLimit, build_http_client};

/// HTTP client for media downloads.
///
/// Create once and reuse; clones share the connection pool.
///
/// # Example
///
/// ```no_run
/// use nezumi_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let media = client.open("https://media.example.com/v.mp4").await?;
/// println!("declared length: {:?}", media.content_length());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// An open media response whose body has not been read yet.
#[derive(Debug)]
pub struct MediaResponse {
    url: String,
    content_length: Option<u64>,
    response: reqwest::Response,
}

impl HttpClient {
    /// Creates a client with the default download timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Idle timeout: 5 minutes without new body bytes
    /// - No limit on total transfer time
    /// - Gzip decompression: enabled
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Interrupted`] if the client cannot be built.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeouts(HttpTimeouts::from_secs(
            CONNECT_TIMEOUT_SECS,
            READ_TIMEOUT_SECS,
        ))
    }

    /// Creates a client with explicit timeouts.
    ///
    /// `timeouts.read` bounds each wait for more body bytes, not the whole
    /// transfer.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Interrupted`] if the client cannot be built.
    pub fn with_timeouts(timeouts: HttpTimeouts) -> Result<Self, DownloadError> {
        let client = build_http_client("media", timeouts, ReadLimit::Idle).map_err(|reason| {
            DownloadError::interrupted(format!("failed to build HTTP client: {reason}"))
        })?;
        Ok(Self { client })
    }

    /// Sends a GET for `url` and returns the response once headers arrive.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] when `url` does not parse
    /// - [`DownloadError::Network`] / [`DownloadError::Timeout`] on transport failure
    /// - [`DownloadError::HttpStatus`] on a non-2xx status
    #[instrument(skip(self), fields(url = %url))]
    pub async fn open(&self, url: &str) -> Result<MediaResponse, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let content_length = declared_length(&response);
        debug!(status = status.as_u16(), content_length = ?content_length, "media response opened");

        Ok(MediaResponse {
            url: url.to_string(),
            content_length,
            response,
        })
    }
}

impl MediaResponse {
    /// Declared body length, `None` when absent or unparsable.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Consumes the response into a stream of body chunks.
    pub fn into_body(self) -> impl Stream<Item = Result<bytes::Bytes, DownloadError>> + Send {
        let url = self.url;
        self.response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| DownloadError::network(url.clone(), e)))
    }
}

fn declared_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
