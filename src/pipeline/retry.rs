//! Backoff policy for catalog fetches.
//!
//! Each failed fetch is mapped to a [`FailureType`] by [`classify_error`];
//! [`RetryPolicy::should_retry`] turns that plus the attempt number into a
//! [`RetryDecision`]. The default policy makes a single attempt.
//!
//! # Example
//!
//! ```
//! use nezumi_core::manifest::ClientError;
//! use nezumi_core::pipeline::{RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::with_max_attempts(3);
//! let error = ClientError::status("https://api.example.com/player", 503);
//!
//! if let RetryDecision::Retry { delay, attempt } = policy.should_retry(classify_error(&error), 1) {
//!     println!("attempt {attempt} in {delay:?}");
//! }
//! ```

use std::fmt;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use crate::manifest::ClientError;

/// Default attempts per fetch (no retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(16);
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;
const MAX_JITTER_MS: u64 = 500;

/// How a fetch failure should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Transport error, timeout, empty body, 5xx or 408.
    Transient,
    /// Any other 4xx, an undecodable manifest or a bad endpoint.
    Permanent,
    /// HTTP 429.
    RateLimited,
}

/// Why a failed fetch is not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Retrying cannot change the result.
    Permanent,
    /// Every allowed attempt was used.
    Exhausted {
        /// The configured attempt limit.
        max_attempts: u32,
    },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent => f.write_str("permanent failure"),
            Self::Exhausted { max_attempts } => {
                write!(f, "all {max_attempts} attempt(s) used")
            }
        }
    }
}

/// Outcome of [`RetryPolicy::should_retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then make attempt number `attempt`.
    Retry {
        /// Backoff before the next attempt.
        delay: Duration,
        /// 1-indexed number of the next attempt.
        attempt: u32,
    },
    /// Give up and surface the last error.
    DoNotRetry {
        /// Why.
        reason: StopReason,
    },
}

/// Exponential backoff with jitter.
///
/// The wait before attempt `n + 1` is
/// `min(base_delay * multiplier^(n-1), max_delay)` plus up to 500 ms of jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_BASE_DELAY,
            DEFAULT_MAX_DELAY,
            DEFAULT_BACKOFF_MULTIPLIER,
        )
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is raised to at least 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Default backoff with a custom attempt limit.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Total attempts allowed, the first included.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what to do after attempt number `attempt` failed.
    #[instrument(level = "debug", skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: StopReason::Permanent,
            };
        }
        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry {
                reason: StopReason::Exhausted {
                    max_attempts: self.max_attempts,
                },
            };
        }

        let delay = self.backoff(attempt) + jitter();
        debug!(attempt, delay_ms = delay.as_millis(), "scheduling retry");
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Backoff without jitter after attempt number `attempt`.
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = f64::from(self.backoff_multiplier).powi(exponent);
        if !factor.is_finite() || factor < 0.0 {
            return self.max_delay;
        }
        Duration::try_from_secs_f64(self.base_delay.as_secs_f64() * factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

fn jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..=MAX_JITTER_MS))
}

/// Maps a client error onto a [`FailureType`].
///
/// | Error | Type |
/// |-------|------|
/// | No status (transport, timeout, empty body) | Transient |
/// | 408, 5xx | Transient |
/// | 429 | RateLimited |
/// | Other 4xx | Permanent |
/// | Invalid manifest or endpoint | Permanent |
#[must_use]
pub fn classify_error(error: &ClientError) -> FailureType {
    match error {
        ClientError::UpstreamUnavailable {
            status: Some(status),
            ..
        } => match status {
            408 => FailureType::Transient,
            429 => FailureType::RateLimited,
            400..=499 => FailureType::Permanent,
            _ => FailureType::Transient,
        },
        ClientError::UpstreamUnavailable { status: None, .. } => FailureType::Transient,
        ClientError::InvalidManifest { .. } | ClientError::InvalidEndpoint { .. } => {
            FailureType::Permanent
        }
    }
}
