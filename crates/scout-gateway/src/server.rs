use crate::config::GatewayConfig;
use crate::correlator::RequestCorrelator;
use crate::lifecycle::{ChannelLifecycle, ConnectError};
use crate::registry::ChannelRegistry;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use scout_core::{ScoutResult, CREDENTIAL_HEADER};
use scout_mcp::{JsonRpcRequest, McpHandler};
use scout_session::CredentialStore;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Shared application state.
pub struct AppState {
    pub lifecycle: Arc<ChannelLifecycle>,
    pub correlator: RequestCorrelator,
}

/// The SSE gateway.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router with a fresh channel registry.
    pub fn build(
        handler: Arc<McpHandler>,
        credentials: Arc<CredentialStore>,
        config: GatewayConfig,
    ) -> ScoutResult<Router> {
        Self::build_with_lifecycle(handler, credentials, config).map(|(app, _)| app)
    }

    /// Build the router and also return the lifecycle manager, so the caller
    /// can close channels on shutdown.
    ///
    /// Fails if `config` does not pass [`GatewayConfig::validate`].
    pub fn build_with_lifecycle(
        handler: Arc<McpHandler>,
        credentials: Arc<CredentialStore>,
        config: GatewayConfig,
    ) -> ScoutResult<(Router, Arc<ChannelLifecycle>)> {
        config.validate()?;
        let registry = ChannelRegistry::new();
        let messages_path = config.messages_path.clone();
        let lifecycle = ChannelLifecycle::new(Arc::clone(&registry), credentials, config);

        let state = Arc::new(AppState {
            lifecycle: Arc::clone(&lifecycle),
            correlator: RequestCorrelator::new(registry, handler),
        });

        let app = Router::new()
            .route("/sse", get(sse_handler))
            .route(&messages_path, post(messages_handler))
            .route("/health", get(health_handler))
            .with_state(state);

        Ok((app, lifecycle))
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "scout",
        "channels": state.lifecycle.open_channels(),
    }))
}

async fn sse_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let secret = headers
        .get(CREDENTIAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match state.lifecycle.connect(secret) {
        Ok(stream) => {
            let interval = Duration::from_secs(state.lifecycle.config().keep_alive_secs);
            Sse::new(stream)
                .keep_alive(KeepAlive::new().interval(interval))
                .into_response()
        }
        Err(e @ ConnectError::MissingCredential(_)) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e @ ConnectError::AtCapacity(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
        Err(ConnectError::Registry(e)) => {
            error!(error = %e, "Failed to open channel");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn messages_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
    body: String,
) -> Response {
    let handle = match state.correlator.resolve(query.session_id.as_deref()) {
        Ok(handle) => handle,
        Err(reason) => {
            warn!(reason = %reason, session_id = ?query.session_id, "Unroutable message");
            return (StatusCode::BAD_REQUEST, "No transport found for sessionId").into_response();
        }
    };

    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!(channel_id = %handle.id(), error = %e, "Rejected malformed message");
            return (StatusCode::BAD_REQUEST, "Invalid message").into_response();
        }
    };

    debug!(channel_id = %handle.id(), method = %request.method, "Message accepted");
    state.correlator.dispatch(handle, request);
    (StatusCode::ACCEPTED, "Accepted").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use scout_skills::SkillRegistry;
    use tower::ServiceExt;

    fn app(config: GatewayConfig) -> (Router, Arc<ChannelLifecycle>) {
        let handler = Arc::new(McpHandler::new(Arc::new(SkillRegistry::new())));
        GatewayServer::build_with_lifecycle(handler, CredentialStore::new(), config).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(GatewayConfig::default());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["channels"], 0);
    }

    #[tokio::test]
    async fn test_post_without_session_id() {
        let (app, _) = app(GatewayConfig::default());
        let response = app
            .oneshot(
                Request::post("/messages")
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "No transport found for sessionId");
    }

    #[tokio::test]
    async fn test_post_unknown_session_id() {
        let (app, _) = app(GatewayConfig::default());
        let response = app
            .oneshot(
                Request::post("/messages?sessionId=nobody")
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_post_invalid_body_to_open_channel() {
        let (app, lifecycle) = app(GatewayConfig::default());
        let stream = lifecycle.connect(Some("k".into())).unwrap();
        let uri = format!("/messages?sessionId={}", stream.id());

        let response = app
            .oneshot(Request::post(uri).body(Body::from("not json")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid message");
    }

    #[tokio::test]
    async fn test_reject_policy_returns_400() {
        let (app, lifecycle) = app(GatewayConfig {
            credential_policy: crate::CredentialPolicy::Reject,
            ..GatewayConfig::default()
        });
        let response = app
            .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            "Missing required header: x-serper-api-key"
        );
        assert_eq!(lifecycle.open_channels(), 0);
    }

    #[tokio::test]
    async fn test_capacity_returns_503() {
        let (app, lifecycle) = app(GatewayConfig {
            max_channels: Some(1),
            ..GatewayConfig::default()
        });
        let _held = lifecycle.connect(None).unwrap();
        let response = app
            .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_sse_response_tears_down_when_dropped() {
        let (app, lifecycle) = app(GatewayConfig::default());
        let response = app
            .oneshot(
                Request::get("/sse")
                    .header(CREDENTIAL_HEADER, "k")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "text/event-stream"
        );
        assert_eq!(lifecycle.open_channels(), 1);
        assert_eq!(lifecycle.credentials().len(), 1);

        drop(response);
        assert_eq!(lifecycle.open_channels(), 0);
        assert!(lifecycle.credentials().is_empty());
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let handler = Arc::new(McpHandler::new(Arc::new(SkillRegistry::new())));
        let result = GatewayServer::build(
            handler,
            CredentialStore::new(),
            GatewayConfig {
                messages_path: "messages".into(),
                ..GatewayConfig::default()
            },
        );
        let err = result.err().unwrap();
        assert!(err.to_string().contains("messages_path"));
    }
}
