//! Error types for the download module.
//!
//! Every variant belongs to one of two classes reported by
//! [`DownloadError::kind`]: the media host failed us, or local output did.

use thiserror::Error;

/// Coarse classification of a download failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadErrorKind {
    /// The media URL could not be fetched.
    UpstreamUnavailable,
    /// Reading the body or writing the output failed.
    IoFailure,
}

/// Errors that can end a download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Transport failure before or while reading the body.
    #[error("network error fetching media {url}: {source}")]
    Network {
        /// Media URL.
        url: String,
        /// Transport error from the client.
        #[source]
        source: reqwest::Error,
    },

    /// The connect or read timeout elapsed.
    #[error("timeout fetching media {url}")]
    Timeout {
        /// Media URL.
        url: String,
    },

    /// The media host answered with a non-success status.
    #[error("media host returned HTTP {status} for {url}")]
    HttpStatus {
        /// Media URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// The media URL does not parse.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected text.
        url: String,
    },

    /// Creating, writing or publishing the output failed.
    #[error("output error for {target}: {source}")]
    Io {
        /// Display name of the output.
        target: String,
        /// Error from the output store.
        #[source]
        source: std::io::Error,
    },

    /// The download task stopped without producing an outcome.
    #[error("download task interrupted: {reason}")]
    Interrupted {
        /// Why the task stopped.
        reason: String,
    },
}

impl DownloadError {
    /// Wraps a transport error. Timeouts become [`DownloadError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Non-success status from the media host.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Elapsed timeout.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Unparsable media URL.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Output store failure for `target`.
    pub fn io(target: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            target: target.into(),
            source,
        }
    }

    /// The task ended without an outcome.
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }

    /// Which side failed: the media host or the local output.
    #[must_use]
    pub fn kind(&self) -> DownloadErrorKind {
        match self {
            Self::HttpStatus { .. } | Self::Timeout { .. } | Self::InvalidUrl { .. } => {
                DownloadErrorKind::UpstreamUnavailable
            }
            // A connect failure never delivered a byte; anything after the
            // headers is a broken body stream.
            Self::Network { source, .. } if source.is_connect() || source.is_request() => {
                DownloadErrorKind::UpstreamUnavailable
            }
            Self::Network { .. } | Self::Io { .. } | Self::Interrupted { .. } => {
                DownloadErrorKind::IoFailure
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_upstream() {
        let error = DownloadError::timeout("https://media.example.com/v.mp4");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://media.example.com/v.mp4"));
        assert_eq!(error.kind(), DownloadErrorKind::UpstreamUnavailable);
    }

    #[test]
    fn test_http_status_is_upstream() {
        let error = DownloadError::http_status("https://media.example.com/v.mp4", 403);
        let msg = error.to_string();
        assert!(msg.contains("403"), "Expected '403' in: {msg}");
        assert_eq!(error.kind(), DownloadErrorKind::UpstreamUnavailable);
    }

    #[test]
    fn test_io_names_target() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io("clip.mp4", io_error);
        let msg = error.to_string();
        assert!(msg.contains("clip.mp4"), "Expected target in: {msg}");
        assert_eq!(error.kind(), DownloadErrorKind::IoFailure);
    }

    #[test]
    fn test_invalid_url_is_upstream() {
        let error = DownloadError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
        assert_eq!(error.kind(), DownloadErrorKind::UpstreamUnavailable);
    }

    #[test]
    fn test_interrupted_is_io_failure() {
        let error = DownloadError::interrupted("task panicked");
        assert!(error.to_string().contains("task panicked"));
        assert_eq!(error.kind(), DownloadErrorKind::IoFailure);
    }
}
