use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use vertex_claude_proxy::config::{ModelRoute, ParamsConfig, ProxyConfig, VertexConfig};
use vertex_claude_proxy::logging::{Decision, SharedLogger};
use vertex_claude_proxy::translate::openai_types::ChatCompletionRequest;
use vertex_claude_proxy::translate::response::{normalize_response, to_chat_completion};
use vertex_claude_proxy::{transform_request, AppState, CallMetadata, TransformOptions};

const TOKEN_ENV: &str = "VERTEX_PROXY_TEST_TOKEN";
const TOKEN: &str = "ya29.test-token";

fn vertex_config(base_url: Option<String>) -> ProxyConfig {
    let mut models = HashMap::new();
    models.insert(
        "claude-sonnet-4.5".to_string(),
        ModelRoute::Id("claude-sonnet-4-5@20250929".to_string()),
    );
    models.insert(
        "claude-sonnet-4.5-thinking".to_string(),
        ModelRoute::Detailed {
            model: "claude-sonnet-4-5@20250929".to_string(),
            max_tokens: Some(8000),
        },
    );

    ProxyConfig {
        port: 0,
        vertex: VertexConfig {
            project_id: "acme-ml".to_string(),
            region: "us-east5".to_string(),
            access_token_env: TOKEN_ENV.to_string(),
            base_url,
            anthropic_version: "vertex-2023-10-16".to_string(),
            max_tokens: 4096,
        },
        models,
        params: ParamsConfig::default(),
    }
}

fn chat_request(raw: Value) -> ChatCompletionRequest {
    serde_json::from_value(raw).unwrap()
}

fn transform(raw: Value) -> Value {
    let payload = transform_request(
        chat_request(raw),
        &CallMetadata::default(),
        &TransformOptions::default(),
        &(),
    );
    serde_json::to_value(payload).unwrap()
}

// ────────────────────────────────────────────────────────────────
// Engine tests (no upstream needed)
// ────────────────────────────────────────────────────────────────

#[test]
fn test_thinking_model_gets_half_budget() {
    let out = transform(json!({
        "model": "claude-sonnet-thinking",
        "max_tokens": 8000,
        "messages": [{"role": "user", "content": "Why is the sky blue?"}]
    }));

    assert_eq!(out["thinking"], json!({"type": "enabled", "budget_tokens": 4000}));
    assert_eq!(out["anthropic_version"], "vertex-2023-10-16");
    assert!(out.get("model").is_none());
}

#[test]
fn test_tools_remove_thinking_everywhere() {
    let out = transform(json!({
        "model": "claude-sonnet-thinking",
        "max_tokens": 8000,
        "tools": [{"type": "function", "function": {
            "name": "lookup", "parameters": {"type": "object", "properties": {}}
        }}],
        "messages": [
            {"role": "user", "content": "find it"},
            {"role": "assistant", "content": [
                {"type": "thinking", "thinking": "I should search", "signature": "sig"},
                {"type": "tool_use", "id": "toolu_1", "name": "lookup", "input": {}}
            ]},
            {"role": "user", "content": [
                {"type": "tool_result", "tool_use_id": "toolu_1", "content": "found"}
            ]}
        ]
    }));

    assert!(out.get("thinking").is_none());
    for message in out["messages"].as_array().unwrap() {
        if let Some(blocks) = message["content"].as_array() {
            assert!(blocks
                .iter()
                .all(|b| b["type"] != "thinking" && b["type"] != "redacted_thinking"));
        }
    }
    assert_eq!(out["messages"][1]["content"][0]["type"], "tool_use");
}

#[test]
fn test_tools_strip_thinking_blocks_that_do_not_decode() {
    let out = transform(json!({
        "model": "claude-sonnet-4.5",
        "tools": [{"type": "function", "function": {"name": "f", "parameters": {"type": "object"}}}],
        "messages": [
            {"role": "user", "content": "q"},
            {"role": "assistant", "content": [
                {"type": "thinking", "thinking": null, "signature": "s"},
                {"type": "text", "text": "a"}
            ]},
            {"role": "user", "content": "q2"}
        ]
    }));
    assert_eq!(out["messages"][1]["content"], "a");
}

#[test]
fn test_tool_choice_without_name_never_forwarded() {
    let out = transform(json!({
        "model": "claude-sonnet-4.5",
        "tool_choice": {"type": "tool"},
        "tools": [{"name": "lookup", "input_schema": {"type": "object"}}],
        "messages": [{"role": "user", "content": "hi"}]
    }));
    assert!(out.get("tool_choice").is_none());
    assert_eq!(out["tools"][0]["name"], "lookup");
}

#[test]
fn test_multi_turn_without_thinking_history() {
    let out = transform(json!({
        "model": "claude-sonnet-thinking",
        "max_tokens": 8000,
        "messages": [
            {"role": "user", "content": "one"},
            {"role": "assistant", "content": "plain"},
            {"role": "user", "content": "two"}
        ]
    }));
    assert!(out.get("thinking").is_none());
}

#[test]
fn test_betas_only_from_allow_list() {
    let out = transform(json!({
        "model": "claude-sonnet-4.5",
        "tools": [
            {"type": "computer_20251124", "name": "computer",
             "display_width_px": 1280, "display_height_px": 800},
            {"type": "tool_search_tool_regex_20251119", "name": "tool_search"}
        ],
        "messages": [{"role": "user", "content": "open the browser"}]
    }));
    assert_eq!(out["anthropic_beta"], json!(["tool-search-tool-2025-10-19"]));
}

#[test]
fn test_reasoning_only_response_round_trip() {
    let vertex: vertex_claude_proxy::translate::anthropic_types::MessagesResponse =
        serde_json::from_value(json!({
            "id": "msg_1",
            "model": "claude-sonnet-4-5@20250929",
            "content": [{"type": "thinking", "thinking": "42", "signature": "s"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 3, "output_tokens": 4}
        }))
        .unwrap();

    let hook: Mutex<Vec<Decision>> = Mutex::new(Vec::new());
    let resp = normalize_response(to_chat_completion(vertex), "claude-sonnet-4.5-thinking", &hook);

    let message = &resp.choices[0].message;
    assert_eq!(message.content, message.reasoning_content);
    assert_eq!(resp.model, "claude-sonnet-4.5-thinking");
    assert_eq!(
        hook.into_inner().unwrap(),
        vec![Decision::ReasoningContentPromoted { choice: 0 }]
    );
}

// ────────────────────────────────────────────────────────────────
// End to end against a mock Vertex upstream
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RecordedCall {
    path: String,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct MockVertex {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

async fn mock_raw_predict(
    State(mock): State<MockVertex>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let fail = body["messages"][0]["content"] == "fail";
    mock.calls.lock().unwrap().push(RecordedCall {
        path: uri.path().to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    if fail {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "type": "error",
                "error": {"type": "rate_limit_error", "message": "Quota exceeded for aiplatform"}
            })),
        )
            .into_response();
    }

    Json(json!({
        "id": "msg_vrtx_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-5@20250929",
        "content": [{"type": "thinking", "thinking": "2 + 2 = 4", "signature": "sig"}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 12, "output_tokens": 7}
    }))
    .into_response()
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a mock Vertex and a proxy pointed at it.
async fn start_stack(log_dir: &tempfile::TempDir) -> (SocketAddr, MockVertex) {
    std::env::set_var(TOKEN_ENV, TOKEN);

    let mock = MockVertex::default();
    let upstream = serve(
        Router::new()
            .route("/v1/*rest", post(mock_raw_predict))
            .with_state(mock.clone()),
    )
    .await;

    let state = Arc::new(AppState {
        config: vertex_config(Some(format!("http://{upstream}"))),
        client: reqwest::Client::new(),
        logger: SharedLogger::new(log_dir.path().join("proxy.jsonl")).unwrap(),
    });
    let proxy = serve(vertex_claude_proxy::build_router(state)).await;

    (proxy, mock)
}

#[tokio::test]
async fn test_full_server_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, mock) = start_stack(&dir).await;
    let client = reqwest::Client::new();

    let health = client.get(format!("http://{addr}/health")).send().await.unwrap();
    assert_eq!(health.status(), 200);

    let resp = client
        .post(format!("http://{addr}/v1/chat/completions"))
        .header("x-user-id", "user-42")
        .json(&json!({
            "model": "claude-sonnet-4.5-thinking",
            "messages": [
                {"role": "system", "content": "Answer with a number."},
                {"role": "user", "content": "What is 2 + 2?"}
            ],
            "presence_penalty": 0.3
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["model"], "claude-sonnet-4.5-thinking");
    assert_eq!(body["choices"][0]["message"]["content"], "2 + 2 = 4");
    assert_eq!(body["choices"][0]["message"]["reasoning_content"], "2 + 2 = 4");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
    assert_eq!(body["usage"]["total_tokens"], 19);

    let calls = mock.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(
        call.path,
        "/v1/projects/acme-ml/locations/us-east5/publishers/anthropic/models/claude-sonnet-4-5@20250929:rawPredict"
    );
    assert_eq!(call.authorization.as_deref(), Some("Bearer ya29.test-token"));
    assert!(call.body.get("model").is_none());
    assert!(call.body.get("presence_penalty").is_none());
    assert_eq!(call.body["max_tokens"], 8000);
    assert_eq!(call.body["thinking"], json!({"type": "enabled", "budget_tokens": 4000}));
    assert_eq!(call.body["system"][0]["text"], "Answer with a number.");
    assert_eq!(call.body["metadata"]["user_id"], "user-42");
    assert_eq!(call.body["messages"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_beta_header_and_provider_error() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, mock) = start_stack(&dir).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/chat/completions"))
        .header("anthropic-beta", "interleaved-thinking-2025-05-14")
        .json(&json!({
            "model": "claude-sonnet-4.5",
            "messages": [{"role": "user", "content": "fail"}]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 429);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Quota exceeded for aiplatform");
    assert_eq!(body["error"]["type"], "rate_limit_error");

    let calls = mock.calls.lock().unwrap().clone();
    assert_eq!(calls[0].body["thinking"]["budget_tokens"], 2048);
}

#[tokio::test]
async fn test_rejected_requests_never_reach_vertex() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, mock) = start_stack(&dir).await;
    let client = reqwest::Client::new();

    let streaming = client
        .post(format!("http://{addr}/v1/chat/completions"))
        .json(&json!({
            "model": "claude-sonnet-4.5",
            "stream": true,
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(streaming.status(), 400);

    let malformed = client
        .post(format!("http://{addr}/v1/chat/completions"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), 400);
    let body: Value = malformed.json().await.unwrap();
    assert_eq!(body["error"]["type"], "invalid_request_error");

    assert!(mock.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_models_endpoint_lists_configured_names() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _mock) = start_stack(&dir).await;

    let body: Value = reqwest::get(format!("http://{addr}/v1/models"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["claude-sonnet-4.5", "claude-sonnet-4.5-thinking"]);
}
