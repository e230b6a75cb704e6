// file: src/chat/server.rs
// description: HTTP proxy serving the chat page and relaying prompts to the model server
// reference: https://docs.rs/axum

use crate::chat::client::ChatClient;
use crate::config::ChatConfig;
use crate::error::{Result, ToolkitError};
use crate::models::{ChatOutcome, ChatRequest};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    client: Arc<ChatClient>,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(ChatClient::new(config.clone())?),
            static_dir: config.static_dir.clone(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/api/chat", post(handle_chat))
        .route("/api/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `host:port` and serves until Ctrl-C
pub async fn serve(config: &ChatConfig) -> Result<()> {
    let state = AppState::new(config)?;
    let app = router(state);

    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Chat proxy listening on {}", bind_addr);
    info!("  GET  /");
    info!("  POST /api/chat");
    info!("  GET  /api/health");
    info!("Base URL: {}", config.base_url);
    info!("Model: {}", config.model);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Chat proxy shutting down gracefully");
        })
        .await
        .map_err(ToolkitError::Io)?;

    info!("Chat proxy stopped");
    Ok(())
}

async fn handle_index(State(state): State<AppState>) -> Response {
    let page = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&page).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!("Cannot serve {}: {}", page.display(), e);
            (StatusCode::NOT_FOUND, "index.html not found").into_response()
        }
    }
}

async fn handle_chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<ChatOutcome>) {
    let request_id = Uuid::new_v4();

    let request = match payload.ok().and_then(|Json(body)| ChatRequest::from_json(&body)) {
        Some(request) => request,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ChatOutcome::failure("Missing required field: prompt")),
            );
        }
    };

    info!(%request_id, "Chat request ({} chars)", request.prompt.len());
    let outcome = state.client.generate(&request).await;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    info!(%request_id, "Chat response status {}", status);

    (status, Json(outcome))
}

async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "base_url": state.client.base_url(),
        "model": state.client.model(),
        "client_initialized": true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::client::tests::{closed_endpoint, spawn_mock_upstream};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(base_url: String, static_dir: PathBuf) -> Router {
        let config = ChatConfig {
            base_url,
            static_dir,
            request_timeout_secs: 5,
            ..ChatConfig::default()
        };
        router(AppState::new(&config).unwrap())
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_chat(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app("http://localhost:9/v1".to_string(), PathBuf::from("."));
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["base_url"], "http://localhost:9/v1");
        assert_eq!(body["model"], "ai/smollm2");
        assert_eq!(body["client_initialized"], true);
    }

    #[tokio::test]
    async fn test_chat_missing_prompt_is_bad_request() {
        let app = app(closed_endpoint().await, PathBuf::from("."));

        for body in ["{\"model\": \"x\"}", "not json"] {
            let response = app.clone().oneshot(post_chat(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = json_body(response).await;
            assert_eq!(body["error"], "Missing required field: prompt");
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn test_chat_success_is_relayed() {
        let app = app(spawn_mock_upstream().await, PathBuf::from("."));
        let response = app
            .oneshot(post_chat("{\"prompt\": \"ping\", \"max_tokens\": 7}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "echo(ai/smollm2): ping [max_tokens=7]");
        assert_eq!(body["model"], "ai/smollm2");
    }

    #[tokio::test]
    async fn test_chat_null_prompt_is_empty_prompt_error() {
        let app = app(closed_endpoint().await, PathBuf::from("."));
        let response = app.oneshot(post_chat("{\"prompt\": null}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Prompt cannot be empty");
    }

    #[tokio::test]
    async fn test_chat_ignores_unusable_optional_fields() {
        let app = app(spawn_mock_upstream().await, PathBuf::from("."));
        let response = app
            .oneshot(post_chat(
                "{\"prompt\": \"ping\", \"max_tokens\": -1, \"temperature\": \"warm\"}",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "echo(ai/smollm2): ping [max_tokens=500]");
    }

    #[tokio::test]
    async fn test_chat_upstream_down_is_server_error() {
        let app = app(closed_endpoint().await, PathBuf::from("."));
        let response = app.oneshot(post_chat("{\"prompt\": \"ping\"}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Connection error")
        );
    }

    #[tokio::test]
    async fn test_index_served_from_static_dir() {
        let temp = TempDir::new().unwrap();
        let app_missing = app(closed_endpoint().await, temp.path().to_path_buf());
        let response = app_missing
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        std::fs::write(temp.path().join("index.html"), "<h1>chat</h1>").unwrap();
        let app_present = app(closed_endpoint().await, temp.path().to_path_buf());
        let response = app_present
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>chat</h1>");
    }
}
