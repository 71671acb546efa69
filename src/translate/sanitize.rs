//! Repairs for client fields Vertex would otherwise reject.
//!
//! Both repairs are idempotent and independent of each other.

use serde::Serialize;

use super::anthropic_types::ToolChoiceDirective;
use super::openai_types::{ChatMessage, MessageContent, Role};

/// Where a tool-choice repair ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizeStage {
    /// On the client's parameters, before conversion.
    Inbound,
    /// On the final payload, after conversion.
    Outbound,
}

/// Drop a tool choice Vertex cannot accept (`tool` without a name, or an
/// unrecognised shape). Valid directives are returned unchanged; no default
/// is substituted for a dropped one. The second value is the dropped
/// directive, if any.
#[must_use]
pub fn repair_tool_choice(
    tool_choice: Option<ToolChoiceDirective>,
) -> (Option<ToolChoiceDirective>, Option<ToolChoiceDirective>) {
    match tool_choice {
        Some(tc) if !tc.is_valid() => (None, Some(tc)),
        other => (other, None),
    }
}

/// Counts from a stripping pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripReport {
    pub messages: usize,
    pub blocks: usize,
}

/// Remove `thinking` and `redacted_thinking` blocks from every assistant
/// message, including the `thinking_blocks` side field. Content emptied this
/// way becomes `""`, never absent.
#[must_use]
pub fn strip_reasoning_blocks(messages: Vec<ChatMessage>) -> (Vec<ChatMessage>, StripReport) {
    let mut report = StripReport::default();

    let cleaned = messages
        .into_iter()
        .map(|mut msg| {
            if msg.role != Role::Assistant {
                return msg;
            }

            let mut removed = msg.thinking_blocks.take().map_or(0, |b| b.len());
            let mut emptied = false;
            if let Some(MessageContent::Blocks(blocks)) = &mut msg.content {
                let before = blocks.len();
                blocks.retain(|b| !b.is_reasoning());
                if blocks.len() < before {
                    removed += before - blocks.len();
                    emptied = blocks.is_empty();
                }
            }
            if emptied {
                msg.content = Some(MessageContent::Text(String::new()));
            }
            if removed > 0 {
                report.messages += 1;
                report.blocks += removed;
            }
            msg
        })
        .collect();

    (cleaned, report)
}
