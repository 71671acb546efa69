//! Tool-kind detection and provider tool augmentation.
//!
//! Provider-defined tools are recognised purely by their `type` tag, e.g.
//! `computer_20250124` or `web_search_20250305`.

use serde_json::{Map, Value};

use super::anthropic_types::ToolDefinition;
use super::openai_types::{ChatMessage, MessageContent};

pub const CODE_EXECUTION_TOOL_TYPE: &str = "code_execution_20250522";
const CODE_EXECUTION_TOOL_NAME: &str = "code_execution";
const DEFAULT_COMPUTER_USE_BETA: &str = "computer-use-2024-10-22";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolKind {
    Function,
    ToolSearch,
    /// Carries the declared type tag, which selects the beta version.
    ComputerUse { version: String },
    WebSearch,
    Other { tag: String },
}

impl ToolKind {
    #[must_use]
    pub fn from_type_tag(tag: &str) -> Self {
        if tag.starts_with("tool_search_tool") {
            Self::ToolSearch
        } else if tag.starts_with("computer_") {
            Self::ComputerUse {
                version: tag.to_string(),
            }
        } else if tag.starts_with("web_search") {
            Self::WebSearch
        } else {
            Self::Other {
                tag: tag.to_string(),
            }
        }
    }
}

#[must_use]
pub fn is_tool_search_used(tools: &[ToolDefinition]) -> bool {
    tools.iter().any(|t| t.kind == ToolKind::ToolSearch)
}

#[must_use]
pub fn is_web_search_used(tools: &[ToolDefinition]) -> bool {
    tools.iter().any(|t| t.kind == ToolKind::WebSearch)
}

/// Version tag of the first computer-use tool, if any.
#[must_use]
pub fn computer_tool_version(tools: &[ToolDefinition]) -> Option<&str> {
    tools.iter().find_map(|t| match &t.kind {
        ToolKind::ComputerUse { version } => Some(version.as_str()),
        _ => None,
    })
}

/// Beta token a computer-use tool version requires. Unknown versions fall
/// back to the oldest published token.
#[must_use]
pub fn computer_use_beta(version: &str) -> &'static str {
    match version {
        "computer_20241022" => "computer-use-2024-10-22",
        "computer_20250124" => "computer-use-2025-01-24",
        "computer_20251124" => "computer-use-2025-11-24",
        _ => DEFAULT_COMPUTER_USE_BETA,
    }
}

fn mentions_container_upload(message: &ChatMessage) -> bool {
    match &message.content {
        Some(MessageContent::Blocks(blocks)) => blocks
            .iter()
            .any(|b| b.type_name() == Some("container_upload")),
        _ => false,
    }
}

fn is_code_execution_tool(tool: &ToolDefinition) -> bool {
    tool.extra
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| t.starts_with("code_execution"))
}

/// Append the provider-managed code execution tool when the conversation
/// uploads files into a container and no code execution tool is declared.
/// Returns the tools and whether one was added.
#[must_use]
pub fn add_code_execution_tool(
    messages: &[ChatMessage],
    mut tools: Vec<ToolDefinition>,
) -> (Vec<ToolDefinition>, bool) {
    if !messages.iter().any(mentions_container_upload) || tools.iter().any(is_code_execution_tool)
    {
        return (tools, false);
    }

    let mut body = Map::new();
    body.insert(
        "type".to_string(),
        Value::String(CODE_EXECUTION_TOOL_TYPE.to_string()),
    );
    body.insert(
        "name".to_string(),
        Value::String(CODE_EXECUTION_TOOL_NAME.to_string()),
    );
    tools.push(ToolDefinition::provider(body));
    (tools, true)
}
