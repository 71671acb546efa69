//! Build the Vertex Messages payload from a chat-completion request.
//!
//! Two branches: conversations that already use Anthropic content blocks are
//! passed through with only the system messages lifted out, and plain OpenAI
//! conversations go through a full role/tool mapping. Both produce a
//! [`MessagesRequest`] with the same defaults applied.

use serde_json::{json, Map, Value};

use super::anthropic_types::{
    ContentBlock, ImageUrlBlock, MessagesRequest, RequestMetadata, SystemBlock, SystemContent,
    ToolResultBlock, ToolUseBlock,
};
use super::openai_types::{
    ChatCompletionRequest, ChatMessage, ChatToolCall, MessageContent, Role, StopSequences,
};

/// Values used for anything the caller left unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDefaults {
    pub anthropic_version: String,
    pub max_tokens: u64,
    /// From call metadata; the request's own `metadata.user_id` or `user` wins.
    pub user_id: Option<String>,
}

/// Convert `req` into a Messages payload. `structured` selects the branch
/// (see [`super::classify::is_structured`]).
#[must_use]
pub fn to_messages_request(
    req: ChatCompletionRequest,
    structured: bool,
    defaults: &PayloadDefaults,
) -> MessagesRequest {
    let ChatCompletionRequest {
        messages: chat_messages,
        system: explicit_system,
        max_tokens,
        max_completion_tokens,
        temperature,
        top_p,
        top_k,
        stop,
        tools,
        tool_choice,
        thinking,
        user,
        metadata,
        anthropic_version,
        extra,
        ..
    } = req;

    let mut system = explicit_system.map(system_blocks).unwrap_or_default();
    let messages = if structured {
        passthrough_messages(chat_messages, &mut system)
    } else {
        convert_messages(chat_messages, &mut system)
    };

    let user_id = metadata
        .and_then(|m| m.user_id)
        .or(user)
        .or_else(|| defaults.user_id.clone());

    MessagesRequest {
        anthropic_version: anthropic_version.unwrap_or_else(|| defaults.anthropic_version.clone()),
        messages,
        max_tokens: max_tokens
            .or(max_completion_tokens)
            .unwrap_or(defaults.max_tokens),
        system: (!system.is_empty()).then_some(system),
        temperature,
        top_p,
        top_k,
        stop_sequences: stop.map(StopSequences::into_vec),
        tools,
        tool_choice,
        thinking,
        metadata: user_id.map(|id| RequestMetadata { user_id: Some(id) }),
        anthropic_beta: None,
        extra,
    }
}

// ---------------------------------------------------------------------------
// System prompt
// ---------------------------------------------------------------------------

fn system_text(text: String) -> Option<SystemBlock> {
    (!text.is_empty()).then_some(SystemBlock::Text {
        text,
        cache_control: None,
    })
}

fn system_blocks(content: SystemContent) -> Vec<SystemBlock> {
    match content {
        SystemContent::Text(text) => system_text(text).into_iter().collect(),
        SystemContent::Blocks(blocks) => blocks,
    }
}

/// Text parts of a system message, keeping per-part `cache_control`.
fn message_system_blocks(content: Option<MessageContent>) -> Vec<SystemBlock> {
    match content {
        Some(MessageContent::Text(text)) => system_text(text).into_iter().collect(),
        Some(MessageContent::Blocks(blocks)) => blocks
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text(mut t) if !t.text.is_empty() => Some(SystemBlock::Text {
                    text: t.text,
                    cache_control: t.extra.remove("cache_control"),
                }),
                _ => None,
            })
            .collect(),
        None => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Structured branch
// ---------------------------------------------------------------------------

fn passthrough_messages(
    messages: Vec<ChatMessage>,
    system: &mut Vec<SystemBlock>,
) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len());
    for msg in messages {
        if msg.role == Role::System {
            system.extend(message_system_blocks(msg.content));
        } else {
            out.push(fold_thinking_blocks(msg));
        }
    }
    out
}

/// `thinking_blocks` is not a Messages field; move its blocks to the front
/// of the content.
fn fold_thinking_blocks(mut msg: ChatMessage) -> ChatMessage {
    let Some(mut blocks) = msg.thinking_blocks.take().filter(|b| !b.is_empty()) else {
        return msg;
    };
    match msg.content.take() {
        Some(MessageContent::Text(text)) if !text.is_empty() => blocks.push(ContentBlock::text(text)),
        Some(MessageContent::Blocks(content)) => blocks.extend(content),
        _ => {}
    }
    msg.content = Some(MessageContent::Blocks(blocks));
    msg
}

// ---------------------------------------------------------------------------
// Generic branch
// ---------------------------------------------------------------------------

fn convert_messages(messages: Vec<ChatMessage>, system: &mut Vec<SystemBlock>) -> Vec<ChatMessage> {
    let mut turns: Vec<(Role, Vec<ContentBlock>)> = Vec::new();

    for msg in messages {
        let (role, blocks) = match msg.role {
            Role::System => {
                system.extend(message_system_blocks(msg.content));
                continue;
            }
            Role::User => (Role::User, user_blocks(msg.content)),
            Role::Assistant => (Role::Assistant, assistant_blocks(msg)),
            Role::Tool => (Role::User, vec![tool_result_block(msg)]),
        };

        // Vertex requires alternating roles
        match turns.last_mut() {
            Some((last_role, last_blocks)) if *last_role == role => last_blocks.extend(blocks),
            _ => turns.push((role, blocks)),
        }
    }

    turns
        .into_iter()
        .map(|(role, blocks)| ChatMessage::with_content(role, collapse_blocks(blocks)))
        .collect()
}

fn user_blocks(content: Option<MessageContent>) -> Vec<ContentBlock> {
    match content {
        Some(MessageContent::Text(text)) => vec![ContentBlock::text(text)],
        Some(MessageContent::Blocks(blocks)) => blocks.into_iter().map(convert_block).collect(),
        None => Vec::new(),
    }
}

/// Thinking blocks first, then text, then tool calls.
fn assistant_blocks(msg: ChatMessage) -> Vec<ContentBlock> {
    let mut blocks = msg.thinking_blocks.unwrap_or_default();

    match msg.content {
        Some(MessageContent::Text(text)) if !text.is_empty() => {
            blocks.push(ContentBlock::text(text));
        }
        Some(MessageContent::Blocks(content)) => {
            blocks.extend(content.into_iter().map(convert_block));
        }
        _ => {}
    }

    blocks.extend(
        msg.tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(tool_use_block),
    );
    blocks
}

fn tool_use_block(call: ChatToolCall) -> ContentBlock {
    let input = serde_json::from_str::<Value>(&call.function.arguments)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(Map::new()));

    ContentBlock::ToolUse(ToolUseBlock {
        id: call.id,
        name: call.function.name,
        input,
        extra: Map::new(),
    })
}

fn tool_result_block(msg: ChatMessage) -> ContentBlock {
    let content = match msg.content {
        Some(MessageContent::Text(text)) => Some(Value::String(text)),
        Some(MessageContent::Blocks(blocks)) => Some(Value::Array(
            blocks
                .into_iter()
                .map(|b| serde_json::to_value(convert_block(b)).unwrap_or_default())
                .collect(),
        )),
        None => None,
    };

    ContentBlock::ToolResult(ToolResultBlock {
        tool_use_id: msg.tool_call_id.unwrap_or_default(),
        content,
        is_error: None,
        extra: Map::new(),
    })
}

fn convert_block(block: ContentBlock) -> ContentBlock {
    match block {
        ContentBlock::ImageUrl(image) => image_block(image),
        other => other,
    }
}

/// `image_url` part -> Anthropic `image` block. Data URIs become base64
/// sources, everything else a url source.
fn image_block(image: ImageUrlBlock) -> ContentBlock {
    let url = image.image_url.url;
    let source = match url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
    {
        Some((header, data)) => {
            let media_type = header.strip_suffix(";base64").unwrap_or(header);
            json!({"type": "base64", "media_type": media_type, "data": data})
        }
        None => json!({"type": "url", "url": url}),
    };
    ContentBlock::Other(json!({"type": "image", "source": source}))
}

/// A lone plain text block goes back to string content.
fn collapse_blocks(mut blocks: Vec<ContentBlock>) -> MessageContent {
    if blocks.is_empty() {
        return MessageContent::Text(String::new());
    }
    let lone_text = matches!(blocks.as_slice(), [ContentBlock::Text(t)] if t.extra.is_empty());
    if lone_text {
        if let Some(ContentBlock::Text(t)) = blocks.pop() {
            return MessageContent::Text(t.text);
        }
    }
    MessageContent::Blocks(blocks)
}
