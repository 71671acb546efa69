//! Map a Vertex Messages response back to a chat completion.

use chrono::Utc;
use uuid::Uuid;

use super::anthropic_types::{ContentBlock, MessagesResponse};
use super::openai_types::{
    ChatCompletionResponse, ChatToolCall, ChatToolCallFunction, ChatUsage, Choice, ChoiceMessage,
};
use crate::logging::{Decision, DecisionHook};

/// Base conversion. `model` is taken from the provider response as is;
/// [`normalize_response`] overwrites it.
#[must_use]
pub fn to_chat_completion(resp: MessagesResponse) -> ChatCompletionResponse {
    let mut text_parts: Vec<String> = Vec::new();
    let mut reasoning_parts: Vec<String> = Vec::new();
    let mut thinking_blocks: Vec<ContentBlock> = Vec::new();
    let mut tool_calls: Vec<ChatToolCall> = Vec::new();

    for block in resp.content {
        match block {
            ContentBlock::Text(t) => text_parts.push(t.text),
            ContentBlock::Thinking(ref t) => {
                reasoning_parts.push(t.thinking.clone());
                thinking_blocks.push(block);
            }
            ContentBlock::RedactedThinking(_) => thinking_blocks.push(block),
            ContentBlock::ToolUse(tool_use) => tool_calls.push(ChatToolCall {
                id: tool_use.id,
                call_type: "function".to_string(),
                function: ChatToolCallFunction {
                    name: tool_use.name,
                    arguments: serde_json::to_string(&tool_use.input).unwrap_or_default(),
                },
            }),
            ContentBlock::ImageUrl(_) | ContentBlock::ToolResult(_) | ContentBlock::Other(_) => {}
        }
    }

    let finish_reason = resp
        .stop_reason
        .as_deref()
        .map_or("stop", map_stop_reason)
        .to_string();

    let usage = ChatUsage {
        prompt_tokens: resp.usage.input_tokens,
        completion_tokens: resp.usage.output_tokens,
        total_tokens: resp.usage.input_tokens + resp.usage.output_tokens,
    };

    let id = if resp.id.is_empty() {
        format!("chatcmpl-{}", Uuid::new_v4())
    } else {
        resp.id
    };

    ChatCompletionResponse {
        id,
        object: "chat.completion".to_string(),
        created: Utc::now().timestamp(),
        model: resp.model,
        choices: vec![Choice {
            index: 0,
            message: ChoiceMessage {
                role: "assistant".to_string(),
                content: (!text_parts.is_empty()).then(|| text_parts.concat()),
                reasoning_content: (!reasoning_parts.is_empty()).then(|| reasoning_parts.join("\n")),
                thinking_blocks: (!thinking_blocks.is_empty()).then_some(thinking_blocks),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            },
            finish_reason: Some(finish_reason),
        }],
        usage: Some(usage),
    }
}

/// Map Anthropic `stop_reason` to OpenAI `finish_reason`.
#[must_use]
pub fn map_stop_reason(reason: &str) -> &'static str {
    match reason {
        "max_tokens" => "length",
        "tool_use" => "tool_calls",
        "refusal" => "content_filter",
        // end_turn, stop_sequence, pause_turn and anything new
        _ => "stop",
    }
}

/// Report the caller's model name and fill empty `content` from
/// `reasoning_content`, since Vertex leaves content empty when the model
/// only produced thinking text.
#[must_use]
pub fn normalize_response(
    mut resp: ChatCompletionResponse,
    requested_model: &str,
    hook: &dyn DecisionHook,
) -> ChatCompletionResponse {
    resp.model = requested_model.to_string();

    for choice in &mut resp.choices {
        let message = &mut choice.message;
        let content_empty = message.content.as_deref().map_or(true, str::is_empty);
        let reasoning = message.reasoning_content.as_deref().filter(|r| !r.is_empty());

        if let (true, Some(reasoning)) = (content_empty, reasoning) {
            message.content = Some(reasoning.to_string());
            hook.record(Decision::ReasoningContentPromoted {
                choice: choice.index,
            });
        }
    }

    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn provider_response(raw: serde_json::Value) -> MessagesResponse {
        serde_json::from_value(raw).unwrap()
    }

    fn completion(content: Option<&str>, reasoning: Option<&str>) -> ChatCompletionResponse {
        ChatCompletionResponse {
            id: "msg_1".to_string(),
            object: "chat.completion".to_string(),
            created: 0,
            model: "claude-sonnet-4-5@20250929".to_string(),
            choices: vec![Choice {
                index: 0,
                message: ChoiceMessage {
                    role: "assistant".to_string(),
                    content: content.map(str::to_string),
                    reasoning_content: reasoning.map(str::to_string),
                    thinking_blocks: None,
                    tool_calls: None,
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        }
    }

    #[test]
    fn test_simple_text_response() {
        let resp = provider_response(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-5@20250929",
            "content": [{"type": "text", "text": "Hello!"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 20}
        }));

        let result = to_chat_completion(resp);

        assert_eq!(result.id, "msg_01");
        assert_eq!(result.object, "chat.completion");
        let choice = &result.choices[0];
        assert_eq!(choice.message.content.as_deref(), Some("Hello!"));
        assert_eq!(choice.finish_reason.as_deref(), Some("stop"));
        assert_eq!(
            result.usage,
            Some(ChatUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30
            })
        );
    }

    #[test]
    fn test_thinking_and_tool_use_response() {
        let resp = provider_response(json!({
            "id": "msg_02",
            "content": [
                {"type": "thinking", "thinking": "need weather", "signature": "sig"},
                {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "London"}}
            ],
            "stop_reason": "tool_use"
        }));

        let result = to_chat_completion(resp);
        let message = &result.choices[0].message;

        assert_eq!(message.content, None);
        assert_eq!(message.reasoning_content.as_deref(), Some("need weather"));
        assert_eq!(message.thinking_blocks.as_ref().map(Vec::len), Some(1));
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, "toolu_1");
        assert_eq!(calls[0].function.name, "get_weather");
        assert_eq!(calls[0].function.arguments, r#"{"city":"London"}"#);
        assert_eq!(result.choices[0].finish_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn test_missing_id_gets_generated() {
        let result = to_chat_completion(MessagesResponse::default());
        assert!(result.id.starts_with("chatcmpl-"));
        assert_eq!(result.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("end_turn"), "stop");
        assert_eq!(map_stop_reason("stop_sequence"), "stop");
        assert_eq!(map_stop_reason("max_tokens"), "length");
        assert_eq!(map_stop_reason("tool_use"), "tool_calls");
        assert_eq!(map_stop_reason("refusal"), "content_filter");
        assert_eq!(map_stop_reason("something_new"), "stop");
    }

    #[test]
    fn test_reasoning_promoted_into_empty_content() {
        let hook: Mutex<Vec<Decision>> = Mutex::new(Vec::new());
        for content in [None, Some("")] {
            let result =
                normalize_response(completion(content, Some("the answer is 4")), "claude-thinking", &hook);
            assert_eq!(result.model, "claude-thinking");
            assert_eq!(result.choices[0].message.content.as_deref(), Some("the answer is 4"));
        }
        assert_eq!(
            hook.into_inner().unwrap(),
            vec![Decision::ReasoningContentPromoted { choice: 0 }; 2]
        );
    }

    #[test]
    fn test_existing_content_is_left_alone() {
        let result = normalize_response(completion(Some("4"), Some("2+2")), "m", &());
        assert_eq!(result.choices[0].message.content.as_deref(), Some("4"));

        let result = normalize_response(completion(None, None), "m", &());
        assert_eq!(result.choices[0].message.content, None);

        let result = normalize_response(completion(None, Some("")), "m", &());
        assert_eq!(result.choices[0].message.content, None);
    }
}
