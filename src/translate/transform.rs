//! Request pipeline: chat completion in, Vertex Messages payload out.
//!
//! Stages run in a fixed order. Tool choice is repaired before anything
//! reads it, and thinking is decided only once the final tool list is known.

use serde_json::{Map, Value};

use super::anthropic_types::{MessagesRequest, ToolChoiceDirective};
use super::capabilities::{decide_reasoning, reasoning_signal, select_betas, ReasoningInputs};
use super::classify::is_structured;
use super::openai_types::{ChatCompletionRequest, ChatMessage};
use super::reasoning::assess_continuity;
use super::request::{to_messages_request, PayloadDefaults};
use super::sanitize::{repair_tool_choice, strip_reasoning_blocks, SanitizeStage};
use super::tools::add_code_execution_tool;
use crate::logging::{Decision, DecisionHook};

pub const DEFAULT_ANTHROPIC_VERSION: &str = "vertex-2023-10-16";
pub const DEFAULT_MAX_TOKENS: u64 = 4096;

const PARALLEL_TOOL_CALLS: &str = "parallel_tool_calls";

/// OpenAI parameters the Messages API does not accept.
const OPENAI_ONLY_PARAMS: &[&str] = &[
    "anthropic_beta",
    "audio",
    "betas",
    "frequency_penalty",
    "function_call",
    "functions",
    "logit_bias",
    "logprobs",
    "modalities",
    "n",
    "parallel_tool_calls",
    "prediction",
    "presence_penalty",
    "reasoning_effort",
    "response_format",
    "seed",
    "service_tier",
    "store",
    "stream_options",
    "top_logprobs",
    "web_search_options",
];

/// Per-call context that is not part of the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    /// Model name as the client sent it, before any routing.
    pub original_model: Option<String>,
    pub user_id: Option<String>,
    /// Raw `anthropic-beta` header value (comma-joined tokens).
    pub anthropic_beta: Option<String>,
    /// Per-model default, used when the request sets no limit.
    pub max_tokens: Option<u64>,
}

/// Provider-level defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    pub anthropic_version: String,
    pub max_tokens: u64,
    /// Extra request parameters to drop besides the built-in list.
    pub drop_params: Vec<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            drop_params: Vec::new(),
        }
    }
}

fn drop_unsupported_params(extra: &mut Map<String, Value>, configured: &[String]) -> Vec<String> {
    let dropped: Vec<String> = extra
        .keys()
        .filter(|key| {
            OPENAI_ONLY_PARAMS.contains(&key.as_str()) || configured.iter().any(|c| c == *key)
        })
        .cloned()
        .collect();
    for key in &dropped {
        extra.remove(key);
    }
    dropped
}

fn record_dropped_tool_choice(
    hook: &dyn DecisionHook,
    stage: SanitizeStage,
    dropped: Option<ToolChoiceDirective>,
) {
    if let Some(tool_choice) = dropped {
        hook.record(Decision::ToolChoiceDropped {
            stage,
            tool_choice: tool_choice.to_json(),
        });
    }
}

/// OpenAI `parallel_tool_calls` becomes `disable_parallel_tool_use` on the
/// tool choice, creating an `auto` directive when the client sent none.
fn map_parallel_tool_calls(req: &mut ChatCompletionRequest) {
    if !req.has_tools() {
        return;
    }
    let Some(Value::Bool(parallel)) = req.extra.get(PARALLEL_TOOL_CALLS).cloned() else {
        return;
    };
    req.extra.remove(PARALLEL_TOOL_CALLS);
    let directive = req
        .tool_choice
        .take()
        .unwrap_or_else(ToolChoiceDirective::auto);
    req.tool_choice = Some(directive.with_parallel_tool_use(parallel));
}

fn strip_reasoning(messages: Vec<ChatMessage>, hook: &dyn DecisionHook) -> Vec<ChatMessage> {
    let (messages, report) = strip_reasoning_blocks(messages);
    if report.blocks > 0 {
        hook.record(Decision::ReasoningBlocksStripped {
            messages: report.messages,
            blocks: report.blocks,
        });
    }
    messages
}

/// Transform a chat-completion request into the Vertex payload.
///
/// Never fails: anything Vertex would reject is dropped and reported to
/// `hook` instead.
pub fn transform_request(
    mut req: ChatCompletionRequest,
    call: &CallMetadata,
    options: &TransformOptions,
    hook: &dyn DecisionHook,
) -> MessagesRequest {
    let (tool_choice, dropped) = repair_tool_choice(req.tool_choice.take());
    record_dropped_tool_choice(hook, SanitizeStage::Inbound, dropped);
    req.tool_choice = tool_choice;
    map_parallel_tool_calls(&mut req);

    let had_tools = req.has_tools();
    if had_tools {
        req.messages = strip_reasoning(std::mem::take(&mut req.messages), hook);
    }

    let structured = is_structured(&req.messages);
    hook.record(Decision::Classified {
        structured,
        messages: req.messages.len(),
    });
    let continuity = assess_continuity(&req.messages);

    let dropped_params = drop_unsupported_params(&mut req.extra, &options.drop_params);
    if !dropped_params.is_empty() {
        hook.record(Decision::ParamsDropped {
            params: dropped_params,
        });
    }

    let explicit_thinking = req.thinking;
    let signal = reasoning_signal(
        call.original_model.as_deref().unwrap_or(&req.model),
        call.anthropic_beta.as_deref(),
        explicit_thinking.is_some(),
    );

    let defaults = PayloadDefaults {
        anthropic_version: options.anthropic_version.clone(),
        max_tokens: call.max_tokens.unwrap_or(options.max_tokens),
        user_id: call.user_id.clone(),
    };
    let mut payload = to_messages_request(req, structured, &defaults);

    let (tools, added) =
        add_code_execution_tool(&payload.messages, payload.tools.take().unwrap_or_default());
    if added {
        hook.record(Decision::CodeExecutionToolAdded);
    }
    payload.tools = (!tools.is_empty()).then_some(tools);
    if added && !had_tools {
        payload.messages = strip_reasoning(std::mem::take(&mut payload.messages), hook);
    }

    payload.extra.remove("model");

    let (tool_choice, dropped) = repair_tool_choice(payload.tool_choice.take());
    record_dropped_tool_choice(hook, SanitizeStage::Outbound, dropped);
    payload.tool_choice = tool_choice;

    let selection = select_betas(payload.tools.as_deref().unwrap_or_default());
    for token in &selection.dropped {
        hook.record(Decision::BetaDropped {
            token: token.clone(),
        });
    }
    payload.anthropic_beta = selection.into_field();
    if let Some(ref betas) = payload.anthropic_beta {
        hook.record(Decision::BetasSelected {
            betas: betas.clone(),
        });
    }

    let (thinking, outcome) = decide_reasoning(ReasoningInputs {
        has_tools: payload.has_tools(),
        explicit: explicit_thinking,
        signal,
        continuity,
        max_tokens: payload.max_tokens,
    });
    payload.thinking = thinking;
    hook.record(Decision::Reasoning { outcome });

    payload
}
