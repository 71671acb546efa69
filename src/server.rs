use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::logging::SharedLogger;
use crate::proxy;
use crate::translate::openai_types::{ChatCompletionRequest, ChatErrorResponse};
use crate::translate::CallMetadata;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

const BETA_HEADER: &str = "anthropic-beta";
/// End-user id for `metadata.user_id` when the body carries none.
const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub config: ProxyConfig,
    pub client: reqwest::Client,
    pub logger: SharedLogger,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/chat/completions", post(handle_chat_completions))
        .route("/chat/completions", post(handle_chat_completions))
        .route("/health", get(handle_health))
        .route("/v1/models", get(handle_models))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let log = state.logger.for_request(Uuid::new_v4().to_string());

    let req: ChatCompletionRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            log.warn("server", format!("Failed to parse request: {e}"));
            return error_response(&ProxyError::invalid_request(format!(
                "Invalid request body: {e}"
            )));
        }
    };

    log.info(
        "server",
        format!(
            "Request: model={} messages={} tools={}",
            req.model,
            req.messages.len(),
            req.tools.as_ref().map_or(0, Vec::len)
        ),
    );

    match proxy::proxy_chat_completion(
        req,
        call_metadata(&headers),
        &state.config,
        &state.client,
        &log,
    )
    .await
    {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => {
            tracing::error!(request_id = log.request_id(), error = %e, "Proxy error");
            log.warn("server", format!("Proxy error: {e}"));
            error_response(&e)
        }
    }
}

/// All `anthropic-beta` header values joined with `,`.
fn beta_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(BETA_HEADER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    (!values.is_empty()).then(|| values.join(","))
}

fn call_metadata(headers: &HeaderMap) -> CallMetadata {
    CallMetadata {
        anthropic_beta: beta_header(headers),
        user_id: headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
        ..CallMetadata::default()
    }
}

fn error_response(err: &ProxyError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
    let message = match err {
        ProxyError::Provider { message, .. } => message.clone(),
        other => other.to_string(),
    };
    let body = ChatErrorResponse::new(err.error_type(), message, Some(status.as_u16()));
    (status, Json(body)).into_response()
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn handle_models(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let mut names: Vec<&String> = state.config.models.keys().collect();
    names.sort();

    let models: Vec<serde_json::Value> = names
        .into_iter()
        .map(|name| {
            serde_json::json!({
                "id": name,
                "object": "model",
                "owned_by": "vertex-ai",
            })
        })
        .collect();

    Json(serde_json::json!({ "data": models, "object": "list" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_beta_header_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        assert_eq!(beta_header(&headers), None);

        headers.append(BETA_HEADER, HeaderValue::from_static("web-search-2025-03-05"));
        headers.append(BETA_HEADER, HeaderValue::from_static(" interleaved-thinking-2025-05-14 "));
        assert_eq!(
            beta_header(&headers).as_deref(),
            Some("web-search-2025-03-05,interleaved-thinking-2025-05-14")
        );
    }

    #[test]
    fn test_call_metadata_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(call_metadata(&headers), CallMetadata::default());

        headers.insert(USER_HEADER, HeaderValue::from_static(" user-42 "));
        headers.insert(BETA_HEADER, HeaderValue::from_static("interleaved-thinking-2025-05-14"));
        let call = call_metadata(&headers);
        assert_eq!(call.user_id.as_deref(), Some("user-42"));
        assert_eq!(
            call.anthropic_beta.as_deref(),
            Some("interleaved-thinking-2025-05-14")
        );
        assert!(call.original_model.is_none());
    }

    #[test]
    fn test_error_response_status() {
        let resp = error_response(&ProxyError::provider(429, "slow down"));
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let resp = error_response(&ProxyError::invalid_request("bad"));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
