//! Beta feature negotiation and extended-thinking activation.

use std::collections::BTreeSet;

use serde::Serialize;

use super::anthropic_types::{ThinkingConfig, ToolDefinition};
use super::reasoning::{fit_explicit, thinking_budget, Continuity, ReasoningOutcome};
use super::tools::{computer_tool_version, computer_use_beta, is_tool_search_used, is_web_search_used};

/// Beta tokens Vertex accepts. Anything else is never forwarded.
pub const SUPPORTED_BETAS: [&str; 4] = [
    "tool-search-tool-2025-10-19",
    "web-search-2025-03-05",
    "computer-use-2024-10-22",
    "computer-use-2025-01-24",
];

const TOOL_SEARCH_BETA: &str = "tool-search-tool-2025-10-19";
const WEB_SEARCH_BETA: &str = "web-search-2025-03-05";

/// Substring that asks for extended thinking in a model name or beta header.
pub const THINKING_MARKER: &str = "thinking";

#[must_use]
pub fn is_supported_beta(token: &str) -> bool {
    SUPPORTED_BETAS.contains(&token)
}

/// Betas implied by the tool list, split into those Vertex accepts and
/// those it does not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BetaSelection {
    pub betas: BTreeSet<String>,
    pub dropped: Vec<String>,
}

impl BetaSelection {
    /// The value for `anthropic_beta`; `None` when nothing was selected.
    #[must_use]
    pub fn into_field(self) -> Option<Vec<String>> {
        (!self.betas.is_empty()).then(|| self.betas.into_iter().collect())
    }
}

#[must_use]
pub fn select_betas(tools: &[ToolDefinition]) -> BetaSelection {
    let mut wanted = Vec::new();
    if is_tool_search_used(tools) {
        wanted.push(TOOL_SEARCH_BETA);
    }
    if let Some(version) = computer_tool_version(tools) {
        wanted.push(computer_use_beta(version));
    }
    if is_web_search_used(tools) {
        wanted.push(WEB_SEARCH_BETA);
    }

    let mut selection = BetaSelection::default();
    for token in wanted {
        if is_supported_beta(token) {
            selection.betas.insert(token.to_string());
        } else {
            selection.dropped.push(token.to_string());
        }
    }
    selection
}

/// What asked for extended thinking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningSignal {
    ModelName,
    BetaHeader,
    ExplicitConfig,
}

fn contains_marker(value: &str) -> bool {
    value.to_ascii_lowercase().contains(THINKING_MARKER)
}

/// `model` should be the name the client originally asked for, not the
/// resolved Vertex id.
#[must_use]
pub fn reasoning_signal(
    model: &str,
    beta_header: Option<&str>,
    has_explicit: bool,
) -> Option<ReasoningSignal> {
    if contains_marker(model) {
        Some(ReasoningSignal::ModelName)
    } else if beta_header.is_some_and(contains_marker) {
        Some(ReasoningSignal::BetaHeader)
    } else if has_explicit {
        Some(ReasoningSignal::ExplicitConfig)
    } else {
        None
    }
}

/// Inputs to the thinking decision for one request.
#[derive(Debug, Clone, Copy)]
pub struct ReasoningInputs {
    pub has_tools: bool,
    pub explicit: Option<ThinkingConfig>,
    pub signal: Option<ReasoningSignal>,
    pub continuity: Continuity,
    pub max_tokens: u64,
}

/// Decide the final `thinking` field.
///
/// Tools always win: thinking is removed even when the caller set it. A
/// caller config is otherwise kept (fitted to `max_tokens`). Only when
/// thinking is requested by signal alone does the continuity guard apply.
#[must_use]
pub fn decide_reasoning(inputs: ReasoningInputs) -> (Option<ThinkingConfig>, ReasoningOutcome) {
    let ReasoningInputs {
        has_tools,
        explicit,
        signal,
        continuity,
        max_tokens,
    } = inputs;

    if has_tools {
        return (
            None,
            ReasoningOutcome::SuppressedByTools {
                removed_explicit: explicit.is_some(),
            },
        );
    }

    if let Some(config) = explicit {
        return match fit_explicit(config, max_tokens) {
            Some(config) => (Some(config), ReasoningOutcome::ExplicitKept { config }),
            None => (None, ReasoningOutcome::InsufficientMaxTokens { max_tokens }),
        };
    }

    let Some(signal) = signal else {
        return (None, ReasoningOutcome::NotRequested);
    };

    if let Continuity::Broken { message_index } = continuity {
        return (None, ReasoningOutcome::RefusedContinuity { message_index });
    }

    match thinking_budget(max_tokens) {
        Some(budget_tokens) => (
            Some(ThinkingConfig::Enabled { budget_tokens }),
            ReasoningOutcome::Activated {
                signal,
                budget_tokens,
                first_turn: continuity == Continuity::FirstTurn,
            },
        ),
        None => (None, ReasoningOutcome::InsufficientMaxTokens { max_tokens }),
    }
}
