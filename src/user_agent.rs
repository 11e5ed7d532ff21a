//! Shared User-Agent string for manifest and media HTTP clients.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/spundev/nezumi";

/// Default User-Agent for every request the crate sends.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("nezumi/{version} (+{PROJECT_UA_URL})")
}
