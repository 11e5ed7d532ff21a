//! Progress samples and cooperative cancellation.

use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::humanize::human_readable_u64;

/// One progress sample of a running download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes written to the output so far.
    pub bytes_transferred: u64,
    /// Declared body length, when the server sent a usable `Content-Length`.
    pub total_bytes: Option<u64>,
}

impl Progress {
    /// Total as a signed value with `-1` meaning unknown.
    #[must_use]
    pub fn total_or_unknown(&self) -> i64 {
        self.total_bytes
            .map_or(-1, |total| i64::try_from(total).unwrap_or(i64::MAX))
    }

    /// Completion percentage, capped at 100. None when the total is unknown or zero.
    #[must_use]
    pub fn percent(&self) -> Option<u8> {
        let total = self.total_bytes.filter(|total| *total > 0)?;
        let pct = (u128::from(self.bytes_transferred) * 100 / u128::from(total)).min(100);
        u8::try_from(pct).ok()
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let done = human_readable_u64(self.bytes_transferred);
        match (self.total_bytes, self.percent()) {
            (Some(total), Some(pct)) => {
                write!(f, "{done} / {} ({pct}%)", human_readable_u64(total))
            }
            (Some(total), None) => write!(f, "{done} / {}", human_readable_u64(total)),
            (None, _) => write!(f, "{done} / unknown"),
        }
    }
}

/// Cancellation flag shared between a download's owner and its copy loop.
///
/// Cloning shares the same flag. Cancellation is sticky.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation and wakes any waiter.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves when cancellation is requested.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }
}
