//! Shared HTTP client construction policy.
//!
//! The manifest client and the media client are built here so both get the
//! same User-Agent, compression and proxy handling, with separate timeouts.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::user_agent;

/// Connect/read timeouts for one HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Time allowed to establish a connection.
    pub connect: Duration,
    /// Read limit; see [`ReadLimit`] for how it is applied.
    pub read: Duration,
}

impl HttpTimeouts {
    /// Creates timeouts from whole seconds.
    #[must_use]
    pub fn from_secs(connect_secs: u64, read_secs: u64) -> Self {
        Self {
            connect: Duration::from_secs(connect_secs),
            read: Duration::from_secs(read_secs),
        }
    }
}

/// How [`HttpTimeouts::read`] is applied to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadLimit {
    /// Caps the whole request, body included.
    WholeRequest,
    /// Caps each wait for more response bytes. Long transfers are fine as
    /// long as data keeps arriving.
    Idle,
}

/// Builds a client using the shared policy.
///
/// Some sandboxed environments panic while querying system proxy settings.
/// In that case the builder is retried with system lookup disabled and only
/// the `*_PROXY` environment variables applied.
///
/// # Errors
///
/// Returns the builder error when construction fails, or a description of the
/// panic when the fallback builder panics too.
pub(crate) fn build_http_client(
    purpose: &str,
    timeouts: HttpTimeouts,
    limit: ReadLimit,
) -> Result<Client, String> {
    let built = match try_build_client(timeouts, limit, ProxyLookup::System) {
        Err(BuildFailure::Panicked) => {
            warn!(
                purpose,
                "system proxy lookup panicked; retrying with *_PROXY variables only"
            );
            try_build_client(timeouts, limit, ProxyLookup::EnvOnly)
        }
        other => other,
    };
    built.map_err(|failure| match failure {
        BuildFailure::Panicked => "HTTP client construction panicked".to_string(),
        BuildFailure::Build(error) => error.to_string(),
    })
}

#[derive(Debug, Clone, Copy)]
enum ProxyLookup {
    System,
    EnvOnly,
}

enum BuildFailure {
    Panicked,
    Build(reqwest::Error),
}

fn try_build_client(
    timeouts: HttpTimeouts,
    limit: ReadLimit,
    lookup: ProxyLookup,
) -> Result<Client, BuildFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let builder = base_builder(timeouts, limit);
        let builder = match lookup {
            ProxyLookup::System => builder,
            ProxyLookup::EnvOnly => apply_env_proxy_fallback(builder.no_proxy()),
        };
        builder.build().map_err(BuildFailure::Build)
    }))
    .map_err(|_| BuildFailure::Panicked)?
}

fn base_builder(timeouts: HttpTimeouts, limit: ReadLimit) -> ClientBuilder {
    let builder = Client::builder().connect_timeout(timeouts.connect);
    let builder = match limit {
        ReadLimit::WholeRequest => builder.timeout(timeouts.read),
        ReadLimit::Idle => builder.read_timeout(timeouts.read),
    };
    builder
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}

const HTTPS_PROXY_VARS: [&str; 4] = ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"];
const HTTP_PROXY_VARS: [&str; 4] = ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"];

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    let https = first_env_value(&HTTPS_PROXY_VARS).and_then(|url| Proxy::https(url).ok());
    let http = first_env_value(&HTTP_PROXY_VARS).and_then(|url| Proxy::http(url).ok());
    for proxy in [https, http].into_iter().flatten() {
        builder = builder.proxy(proxy);
    }
    builder
}

fn first_env_value(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
