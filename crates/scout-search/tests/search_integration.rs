#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the Serper client and the search_web tool against a
//! mocked search API.

use scout_core::{ChannelId, ToolCall, ToolContext};
use scout_search::{SearchError, SearchProvider, SerperClient, SerperConfig, WebSearchSkill};
use scout_session::CredentialStore;
use scout_skills::Skill;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> SerperClient {
    let config = SerperConfig {
        base_url: server.uri(),
        ..SerperConfig::default()
    };
    SerperClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_request_shape_and_parsing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("X-API-KEY", "key-123"))
        .and(body_json(serde_json::json!({"q": "rust async", "num": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "organic": [
                {"title": "Tokio", "link": "https://tokio.rs", "snippet": "An async runtime"},
                {"title": "Async Book", "link": "https://rust-lang.github.io/async-book/", "snippet": "Guide"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = client_for(&server)
        .search("rust async", "key-123", 3)
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Tokio");
    assert_eq!(hits[1].link, "https://rust-lang.github.io/async-book/");
}

#[tokio::test]
async fn test_result_count_is_capped() {
    let server = MockServer::start().await;
    let organic: Vec<_> = (0..8)
        .map(|i| serde_json::json!({"title": format!("T{i}"), "link": format!("http://t{i}")}))
        .collect();
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "organic": organic })),
        )
        .mount(&server)
        .await;

    let hits = client_for(&server).search("q", "k", 3).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[2].title, "T2");
    assert_eq!(hits[2].snippet, "");
}

#[tokio::test]
async fn test_non_2xx_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Unauthorized."))
        .mount(&server)
        .await;

    let err = client_for(&server).search("q", "bad", 3).await.unwrap_err();
    match err {
        SearchError::Status { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "Unauthorized.");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).search("q", "k", 3).await.unwrap_err();
    assert!(matches!(err, SearchError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_provider_is_network_error() {
    let config = SerperConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_secs: 2,
        ..SerperConfig::default()
    };
    let client = SerperClient::new(&config).unwrap();
    let err = client.search("q", "k", 3).await.unwrap_err();
    assert!(matches!(err, SearchError::Network(_)));
}

#[tokio::test]
async fn test_skill_against_failing_provider_returns_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway from upstream-7"))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = CredentialStore::new();
    let id = ChannelId::mint();
    credentials.put(&id, "k");
    let skill = WebSearchSkill::new(Arc::new(client_for(&server)), credentials);

    let call = ToolCall {
        id: "7".into(),
        name: "search_web".into(),
        arguments: serde_json::json!({"query": "anything"}),
    };
    let result = skill
        .execute(call, &ToolContext::for_channel(id))
        .await
        .unwrap();

    assert!(result.is_error);
    assert!(result.content.starts_with("Search failed"));
    assert!(!result.content.contains("upstream-7"));
}
