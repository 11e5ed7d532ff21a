//! Manifest endpoint configuration.
//!
//! The upstream API is undocumented and its client-version string goes stale,
//! so every upstream-specific value is configuration rather than a literal in
//! the request code.

use crate::http::HttpTimeouts;

/// Default manifest endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://youtubei.googleapis.com/youtubei/v1/player";

/// Default `hl` locale sent in the client context.
pub const DEFAULT_LOCALE: &str = "en";

/// Default client name sent in the client context.
pub const DEFAULT_CLIENT_NAME: &str = "WEB";

/// Default client version sent in the client context.
pub const DEFAULT_CLIENT_VERSION: &str = "2.20230427.04.00";

/// Environment variable consulted for the API key by the CLI.
pub const API_KEY_ENV: &str = "NEZUMI_API_KEY";

/// Default manifest connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default manifest read timeout (30 seconds).
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Settings for [`ManifestClient`](super::ManifestClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestConfig {
    /// Endpoint the manifest request is POSTed to.
    pub endpoint: String,
    /// API key appended as the `key` query parameter. None by default.
    pub api_key: Option<String>,
    /// `hl` locale.
    pub locale: String,
    /// `clientName` value.
    pub client_name: String,
    /// `clientVersion` value.
    pub client_version: String,
    /// HTTP timeouts for manifest requests.
    pub timeouts: HttpTimeouts,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            locale: DEFAULT_LOCALE.to_string(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            client_version: DEFAULT_CLIENT_VERSION.to_string(),
            timeouts: HttpTimeouts::from_secs(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS),
        }
    }
}

impl ManifestConfig {
    /// Overrides the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the client version string.
    #[must_use]
    pub fn with_client_version(mut self, client_version: impl Into<String>) -> Self {
        self.client_version = client_version.into();
        self
    }

    /// Overrides the HTTP timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}
