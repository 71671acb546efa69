//! Extended thinking: continuity check and token budget.
//!
//! Vertex only accepts `thinking` on a turn if every earlier assistant turn
//! carries its thinking blocks. Once a conversation has an assistant turn
//! without them, thinking stays off for the rest of that conversation.

use std::fmt;

use serde::Serialize;

use super::anthropic_types::{ContentBlock, ThinkingConfig};
use super::capabilities::ReasoningSignal;
use super::openai_types::{ChatMessage, Role};

pub const MIN_BUDGET_TOKENS: u64 = 1024;
/// Tokens kept free for the visible answer.
pub const RESPONSE_HEADROOM: u64 = 100;

/// Result of scanning the prior assistant turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuity {
    FirstTurn,
    Preserved { assistant_turns: usize },
    /// `message_index` is the first assistant message without thinking.
    Broken { message_index: usize },
}

impl Continuity {
    #[must_use]
    pub fn allows_activation(self) -> bool {
        !matches!(self, Self::Broken { .. })
    }
}

fn has_reasoning_evidence(msg: &ChatMessage) -> bool {
    msg.thinking_blocks.as_ref().is_some_and(|b| !b.is_empty())
        || msg.blocks().iter().any(ContentBlock::is_reasoning)
}

/// Check every assistant message before the final (current) message.
#[must_use]
pub fn assess_continuity(messages: &[ChatMessage]) -> Continuity {
    let history = messages.split_last().map_or(&[][..], |(_, rest)| rest);

    let mut assistant_turns = 0;
    for (index, msg) in history.iter().enumerate() {
        if msg.role != Role::Assistant {
            continue;
        }
        if !has_reasoning_evidence(msg) {
            return Continuity::Broken {
                message_index: index,
            };
        }
        assistant_turns += 1;
    }

    if assistant_turns == 0 {
        Continuity::FirstTurn
    } else {
        Continuity::Preserved { assistant_turns }
    }
}

/// Half of `max_tokens` rounded down, at least [`MIN_BUDGET_TOKENS`] and at most
/// `max_tokens - RESPONSE_HEADROOM` (the ceiling wins). `None` when the
/// result would fall below the provider minimum.
#[must_use]
pub fn thinking_budget(max_tokens: u64) -> Option<u64> {
    clamp_budget(max_tokens / 2, max_tokens)
}

/// Bring a requested budget into `[MIN_BUDGET_TOKENS, max_tokens - 100]`.
#[must_use]
pub fn clamp_budget(budget: u64, max_tokens: u64) -> Option<u64> {
    let budget = budget
        .max(MIN_BUDGET_TOKENS)
        .min(max_tokens.saturating_sub(RESPONSE_HEADROOM));
    (budget >= MIN_BUDGET_TOKENS).then_some(budget)
}

/// Fit a caller-supplied config to `max_tokens`. `None` when an enabled
/// config cannot satisfy the provider minimum.
#[must_use]
pub fn fit_explicit(config: ThinkingConfig, max_tokens: u64) -> Option<ThinkingConfig> {
    match config {
        ThinkingConfig::Enabled { budget_tokens } => {
            clamp_budget(budget_tokens, max_tokens)
                .map(|budget_tokens| ThinkingConfig::Enabled { budget_tokens })
        }
        ThinkingConfig::Disabled => Some(ThinkingConfig::Disabled),
    }
}

/// What happened to extended thinking for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReasoningOutcome {
    NotRequested,
    /// Tools are present; any caller config was removed.
    SuppressedByTools { removed_explicit: bool },
    Activated {
        signal: ReasoningSignal,
        budget_tokens: u64,
        first_turn: bool,
    },
    RefusedContinuity { message_index: usize },
    ExplicitKept { config: ThinkingConfig },
    InsufficientMaxTokens { max_tokens: u64 },
}

impl fmt::Display for ReasoningOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequested => write!(f, "not requested"),
            Self::SuppressedByTools { removed_explicit } => {
                write!(f, "disabled because tools are present")?;
                if *removed_explicit {
                    write!(f, " (removed caller config)")?;
                }
                Ok(())
            }
            Self::Activated {
                signal,
                budget_tokens,
                first_turn,
            } => {
                let turn = if *first_turn { "first turn" } else { "multi-turn" };
                write!(f, "enabled via {signal:?}, {turn}, budget {budget_tokens}")
            }
            Self::RefusedContinuity { message_index } => write!(
                f,
                "skipped, assistant message {message_index} has no thinking blocks"
            ),
            Self::ExplicitKept { config } => write!(f, "caller config kept: {config:?}"),
            Self::InsufficientMaxTokens { max_tokens } => {
                write!(f, "skipped, max_tokens {max_tokens} leaves no valid budget")
            }
        }
    }
}
