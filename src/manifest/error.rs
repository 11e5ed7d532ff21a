//! Error types for the manifest client.

use thiserror::Error;

use crate::catalog::ManifestError;

/// Errors that can occur while fetching a manifest.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint could not be reached or did not return a usable body.
    #[error("manifest endpoint {endpoint} unavailable: {reason}")]
    UpstreamUnavailable {
        /// Endpoint that was called (without the API key).
        endpoint: String,
        /// HTTP status when the server answered.
        status: Option<u16>,
        /// What went wrong.
        reason: String,
    },

    /// The body was received but is not a valid manifest.
    #[error("invalid manifest for video {video_id}: {source}")]
    InvalidManifest {
        /// Video the manifest was requested for.
        video_id: String,
        /// The decode failure.
        #[source]
        source: ManifestError,
    },

    /// The configured endpoint is not an http(s) URL, or the HTTP client
    /// could not be built.
    #[error("invalid manifest client configuration for {endpoint}: {reason}")]
    InvalidEndpoint {
        /// The offending endpoint.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ClientError {
    /// Creates an `UpstreamUnavailable` error for a non-success status.
    pub fn status(endpoint: impl Into<String>, status: u16) -> Self {
        Self::UpstreamUnavailable {
            endpoint: endpoint.into(),
            status: Some(status),
            reason: format!("HTTP {status}"),
        }
    }

    /// Creates an `UpstreamUnavailable` error from a transport failure.
    pub fn network(endpoint: impl Into<String>, source: &reqwest::Error) -> Self {
        let reason = if source.is_timeout() {
            "request timed out".to_string()
        } else {
            source.to_string()
        };
        Self::UpstreamUnavailable {
            endpoint: endpoint.into(),
            status: None,
            reason,
        }
    }

    /// Creates an `UpstreamUnavailable` error for a response without a body.
    pub fn empty_body(endpoint: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            endpoint: endpoint.into(),
            status: None,
            reason: "empty response body".to_string(),
        }
    }

    /// Creates an `UpstreamUnavailable` error for an orchestrator-level timeout.
    pub fn timed_out(endpoint: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            endpoint: endpoint.into(),
            status: None,
            reason: "fetch timed out".to_string(),
        }
    }

    /// Creates an `InvalidManifest` error.
    pub fn invalid_manifest(video_id: impl Into<String>, source: ManifestError) -> Self {
        Self::InvalidManifest {
            video_id: video_id.into(),
            source,
        }
    }

    /// Creates an `InvalidEndpoint` error.
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for failures of the upstream service itself.
    #[must_use]
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }
}
