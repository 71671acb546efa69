use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use crate::logging::RequestLog;
use crate::translate::anthropic_types::{MessagesResponse, ProviderErrorEnvelope};
use crate::translate::openai_types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::translate::response::{normalize_response, to_chat_completion};
use crate::translate::transform::{transform_request, CallMetadata};
use crate::vertex::{is_supported_model, VertexEndpoint};

use bytes::Bytes;

/// Forward a chat-completion request to Claude on Vertex AI and map the
/// answer back.
///
/// `call` carries what the server read from the inbound headers; routing
/// fills in the model and its `max_tokens` default.
pub async fn proxy_chat_completion(
    req: ChatCompletionRequest,
    call: CallMetadata,
    config: &ProxyConfig,
    client: &reqwest::Client,
    log: &RequestLog,
) -> Result<ChatCompletionResponse> {
    if req.stream == Some(true) {
        return Err(ProxyError::invalid_request(
            "Streaming is not supported by this proxy; send stream=false",
        ));
    }

    let token = config.resolve_access_token()?;
    let resolved = config.resolve_model(&req.model);
    if !is_supported_model(&resolved.vertex_model) {
        log.warn(
            "proxy",
            format!(
                "Model '{}' does not look like a Claude model; forwarding anyway",
                resolved.vertex_model
            ),
        );
    }

    let call = CallMetadata {
        original_model: Some(resolved.requested.clone()),
        max_tokens: resolved.max_tokens,
        ..call
    };
    let payload = transform_request(req, &call, &config.transform_options(), log);

    let url = VertexEndpoint::from_config(&config.vertex).url_for_model(&resolved.vertex_model);
    log.info(
        "proxy",
        format!(
            "POST {} model={} max_tokens={} thinking={}",
            url,
            resolved.vertex_model,
            payload.max_tokens,
            payload.thinking.is_some()
        ),
    );

    let response = client
        .post(&url)
        .bearer_auth(&token)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    let status = response.status().as_u16();
    let body: Bytes = response.bytes().await?;

    tracing::debug!(status, body_len = body.len(), "Vertex response");

    if status >= 400 {
        let message = provider_error_message(&body);
        log.warn("proxy", format!("Vertex error status={status}: {message}"));
        return Err(ProxyError::provider(status, message));
    }

    let vertex_resp: MessagesResponse = serde_json::from_slice(&body).map_err(|e| {
        ProxyError::translation(format!(
            "Failed to parse Vertex response: {}. Body: {}",
            e,
            truncate(&String::from_utf8_lossy(&body), 300)
        ))
    })?;

    let completion = normalize_response(to_chat_completion(vertex_resp), &resolved.requested, log);

    if let Some(ref usage) = completion.usage {
        log.info(
            "proxy",
            format!(
                "Completed: in={} out={} tokens",
                usage.prompt_tokens, usage.completion_tokens
            ),
        );
    }

    Ok(completion)
}

/// The provider's own error message, or the start of the raw body.
fn provider_error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ProviderErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            let text = truncate(text.trim(), 500);
            if text.is_empty() {
                "empty response body".to_string()
            } else {
                text.to_string()
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
