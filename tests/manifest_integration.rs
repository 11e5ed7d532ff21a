//! Integration tests for the manifest client against a mock endpoint.

use nezumi_core::{ClientError, ManifestClient, ManifestConfig, VideoId};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

const PLAYER_PATH: &str = "/youtubei/v1/player";

fn manifest_body() -> serde_json::Value {
    json!({
        "playabilityStatus": {"status": "OK"},
        "streamingData": {
            "formats": [{
                "itag": 18,
                "url": "https://media.example.com/18",
                "quality": "medium",
                "mimeType": "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\""
            }],
            "adaptiveFormats": [{
                "itag": 251,
                "url": "https://media.example.com/251",
                "quality": "tiny",
                "mimeType": "audio/webm; codecs=\"opus\""
            }]
        },
        "videoDetails": {
            "videoId": "dQw4w9WgXcQ",
            "title": "Test clip",
            "lengthSeconds": "212",
            "author": "Test channel"
        }
    })
}

fn client_for(server: &MockServer, config: ManifestConfig) -> ManifestClient {
    ManifestClient::new(config.with_endpoint(format!("{}{PLAYER_PATH}", server.uri()))).unwrap()
}

fn video_id() -> VideoId {
    VideoId::parse("dQw4w9WgXcQ").unwrap()
}

#[tokio::test]
async fn test_fetch_catalog_posts_client_context() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path(PLAYER_PATH))
        .and(body_partial_json(json!({
            "videoId": "dQw4w9WgXcQ",
            "context": {
                "client": {
                    "hl": "en",
                    "clientName": "WEB",
                    "clientVersion": "2.20990101.00.00",
                    "mainAppWebInfo": {"graftUrl": "/watch?v=dQw4w9WgXcQ"}
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(
        &server,
        ManifestConfig::default().with_client_version("2.20990101.00.00"),
    );
    let catalog = client.fetch_catalog(&video_id()).await.unwrap();

    assert_eq!(catalog.video_details.title, "Test clip");
    let itags: Vec<u32> = catalog.all_formats().iter().map(|f| f.itag).collect();
    assert_eq!(itags, vec![18, 251]);
    assert_eq!(catalog.streaming_data.find(251).unwrap().mime_type(), "audio/webm");
}

#[tokio::test]
async fn test_api_key_sent_as_query_parameter() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path(PLAYER_PATH))
        .and(query_param("key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ManifestConfig::default().with_api_key("secret-key"));
    client.fetch_catalog(&video_id()).await.unwrap();
}

#[tokio::test]
async fn test_no_key_parameter_without_api_key() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path(PLAYER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest_body()))
        .mount(&server)
        .await;

    let client = client_for(&server, ManifestConfig::default());
    client.fetch_catalog(&video_id()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        !requests[0].url.query_pairs().any(|(name, _)| name == "key"),
        "unexpected key parameter in {}",
        requests[0].url
    );
}

#[tokio::test]
async fn test_server_error_is_upstream_unavailable() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path(PLAYER_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server, ManifestConfig::default());
    let err = client.fetch_catalog(&video_id()).await.unwrap_err();

    assert!(
        matches!(err, ClientError::UpstreamUnavailable { status: Some(500), .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_empty_body_is_upstream_unavailable() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path(PLAYER_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, ManifestConfig::default());
    let err = client.fetch_catalog(&video_id()).await.unwrap_err();

    assert!(
        matches!(err, ClientError::UpstreamUnavailable { status: None, .. }),
        "got {err:?}"
    );
    assert!(err.to_string().contains("empty response body"));
}

#[tokio::test]
async fn test_malformed_body_is_invalid_manifest() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path(PLAYER_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"playabilityStatus": {"status": "ERROR"}})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, ManifestConfig::default());
    let err = client.fetch_catalog(&video_id()).await.unwrap_err();

    assert!(matches!(err, ClientError::InvalidManifest { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_endpoint_is_upstream_unavailable() {
    let client = ManifestClient::new(
        ManifestConfig::default().with_endpoint("http://127.0.0.1:9/youtubei/v1/player"),
    )
    .unwrap();
    let err = client.fetch_catalog(&video_id()).await.unwrap_err();

    assert!(
        matches!(err, ClientError::UpstreamUnavailable { status: None, .. }),
        "got {err:?}"
    );
}
