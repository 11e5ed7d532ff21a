//! HTTP client for the upstream player endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument};
use url::Url;

use super::CatalogSource;
use super::config::ManifestConfig;
use super::error::ClientError;
use crate::catalog::PlayerResponse;
use crate::http::{ReadLimit, build_http_client};
use crate::parser::VideoId;

/// Client for the manifest endpoint.
///
/// Holds no per-call state: each fetch is independent and only the
/// underlying connection pool is shared. Cloning is cheap.
///
/// # Example
///
/// ```no_run
/// use nezumi_core::manifest::{ManifestClient, ManifestConfig};
/// use nezumi_core::parser::resolve;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ManifestClient::new(ManifestConfig::default().with_api_key("my-key"))?;
/// let id = resolve("https://youtu.be/dQw4w9WgXcQ")?;
/// let catalog = client.fetch_catalog(&id).await?;
/// println!("{}: {} formats", catalog.video_details.title, catalog.all_formats().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ManifestClient {
    client: Client,
    endpoint: Url,
    endpoint_display: String,
    config: ManifestConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerRequest<'a> {
    context: RequestContext<'a>,
    video_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RequestContext<'a> {
    client: ClientContext<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientContext<'a> {
    hl: &'a str,
    client_name: &'a str,
    client_version: &'a str,
    main_app_web_info: MainAppWebInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MainAppWebInfo {
    graft_url: String,
}

impl ManifestClient {
    /// Creates a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidEndpoint`] when the endpoint is not an
    /// http(s) URL or the HTTP client cannot be built.
    #[instrument(level = "debug", skip(config), fields(endpoint = %config.endpoint))]
    pub fn new(config: ManifestConfig) -> Result<Self, ClientError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ClientError::invalid_endpoint(&config.endpoint, e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ClientError::invalid_endpoint(
                &config.endpoint,
                format!("scheme '{}' is not supported", endpoint.scheme()),
            ));
        }

        let client = build_http_client("manifest", config.timeouts, ReadLimit::WholeRequest)
            .map_err(|reason| ClientError::invalid_endpoint(&config.endpoint, reason))?;

        Ok(Self {
            client,
            endpoint_display: endpoint.to_string(),
            endpoint,
            config,
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &ManifestConfig {
        &self.config
    }

    /// Fetches and decodes the manifest for one video.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UpstreamUnavailable`] on transport failure, non-2xx
    ///   status, or an empty body.
    /// - [`ClientError::InvalidManifest`] when the body does not decode.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn fetch_catalog(&self, video_id: &VideoId) -> Result<PlayerResponse, ClientError> {
        let body = self.request_body(video_id);
        debug!("requesting manifest");

        let response = self
            .client
            .post(self.request_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::network(&self.endpoint_display, &e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "manifest endpoint returned error status");
            return Err(ClientError::status(&self.endpoint_display, status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::network(&self.endpoint_display, &e))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ClientError::empty_body(&self.endpoint_display));
        }

        let catalog = PlayerResponse::from_slice(&bytes)
            .map_err(|e| ClientError::invalid_manifest(video_id.as_str(), e))?;
        info!(
            title = %catalog.video_details.title,
            formats = catalog.all_formats().len(),
            "manifest fetched"
        );
        Ok(catalog)
    }

    fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Some(key) = self.config.api_key.as_deref() {
            url.query_pairs_mut().append_pair("key", key);
        }
        url
    }

    fn request_body<'a>(&'a self, video_id: &'a VideoId) -> PlayerRequest<'a> {
        PlayerRequest {
            context: RequestContext {
                client: ClientContext {
                    hl: &self.config.locale,
                    client_name: &self.config.client_name,
                    client_version: &self.config.client_version,
                    main_app_web_info: MainAppWebInfo {
                        graft_url: format!("/watch?v={video_id}"),
                    },
                },
            },
            video_id: video_id.as_str(),
        }
    }
}

#[async_trait]
impl CatalogSource for ManifestClient {
    async fn fetch_catalog(&self, video_id: &VideoId) -> Result<PlayerResponse, ClientError> {
        ManifestClient::fetch_catalog(self, video_id).await
    }

    fn endpoint(&self) -> &str {
        &self.endpoint_display
    }
}
