//! Decide whether a conversation is already in Anthropic block format.
//!
//! This is a heuristic, not validation: a conversation made only of plain
//! strings is treated as OpenAI format even if a client produced it from
//! Anthropic messages.

use super::anthropic_types::ContentBlock;
use super::openai_types::ChatMessage;

/// Decided on the `type` tag alone, so blocks kept as raw JSON count too.
fn is_anthropic_marker(block: &ContentBlock) -> bool {
    matches!(
        block.type_name(),
        Some("tool_use" | "tool_result" | "thinking")
    )
}

/// True iff some message carries a `tool_use`, `tool_result` or `thinking`
/// content block.
#[must_use]
pub fn is_structured(messages: &[ChatMessage]) -> bool {
    messages
        .iter()
        .any(|m| m.blocks().iter().any(is_anthropic_marker))
}
