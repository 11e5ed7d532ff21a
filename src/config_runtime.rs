//! Merges CLI flags, the config file and built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use nezumi_core::download::{DEFAULT_CHUNK_SIZE, EngineConfig};
use nezumi_core::http::HttpTimeouts;
use nezumi_core::manifest::{API_KEY_ENV, ManifestConfig};
use nezumi_core::pipeline::{PipelineConfig, RetryPolicy};

use crate::app_config::FileConfig;
use crate::cli::Args;

/// Effective settings for one run.
#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) output_dir: PathBuf,
    pub(crate) manifest: ManifestConfig,
    pub(crate) engine: EngineConfig,
    pub(crate) pipeline: PipelineConfig,
}

/// Builds the run settings. CLI flags win over file values; the API key
/// falls back to `env_api_key` when neither sets it.
pub(crate) fn resolve_settings(
    args: &Args,
    file: Option<&FileConfig>,
    env_api_key: Option<String>,
) -> RuntimeSettings {
    let empty = FileConfig::default();
    let file = file.unwrap_or(&empty);

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| file.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut manifest = ManifestConfig::default();
    manifest.timeouts = apply_timeouts(
        manifest.timeouts,
        file.manifest_connect_timeout_secs,
        file.manifest_read_timeout_secs,
    );
    if let Some(endpoint) = args.endpoint.clone().or_else(|| file.endpoint.clone()) {
        manifest = manifest.with_endpoint(endpoint);
    }
    if let Some(version) = args
        .client_version
        .clone()
        .or_else(|| file.client_version.clone())
    {
        manifest = manifest.with_client_version(version);
    }
    if let Some(name) = file.client_name.clone() {
        manifest.client_name = name;
    }
    if let Some(locale) = file.locale.clone() {
        manifest.locale = locale;
    }
    let api_key = args
        .api_key
        .clone()
        .or_else(|| file.api_key.clone())
        .or(env_api_key)
        .filter(|key| !key.trim().is_empty());
    if let Some(key) = api_key {
        manifest = manifest.with_api_key(key);
    }

    let mut engine = EngineConfig::default();
    engine.chunk_size = args
        .chunk_size
        .or(file.chunk_size)
        .unwrap_or(DEFAULT_CHUNK_SIZE);
    engine.timeouts = apply_timeouts(
        engine.timeouts,
        file.download_connect_timeout_secs,
        file.download_read_timeout_secs,
    );

    let max_retries = args.max_retries.or(file.max_retries).unwrap_or(0);
    let pipeline = PipelineConfig {
        retry_policy: RetryPolicy::with_max_attempts(u32::from(max_retries) + 1),
        ..PipelineConfig::default()
    };

    RuntimeSettings {
        output_dir,
        manifest,
        engine,
        pipeline,
    }
}

fn apply_timeouts(
    mut timeouts: HttpTimeouts,
    connect_secs: Option<u64>,
    read_secs: Option<u64>,
) -> HttpTimeouts {
    if let Some(secs) = connect_secs {
        timeouts.connect = Duration::from_secs(secs);
    }
    if let Some(secs) = read_secs {
        timeouts.read = Duration::from_secs(secs);
    }
    timeouts
}

/// Reads the API key fallback from the environment.
pub(crate) fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok()
}
