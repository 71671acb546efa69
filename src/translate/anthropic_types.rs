//! Type definitions for the Anthropic Messages API as served by Vertex AI.
//!
//! Content blocks, tool definitions and tool-choice directives arrive in more
//! than one shape (OpenAI and Anthropic clients both talk to the proxy), so
//! they are decoded once into closed enums here. Anything the engine does not
//! model falls into an `Other`/`Malformed` variant and is written back
//! verbatim.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use super::openai_types::ChatMessage;
use super::tools::ToolKind;

// ---------------------------------------------------------------------------
// Content blocks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(TextBlock),
    ImageUrl(ImageUrlBlock),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
    Thinking(ThinkingBlock),
    RedactedThinking(RedactedThinkingBlock),
    /// Any block this crate does not interpret (`image`, `document`,
    /// `container_upload`, ...). Forwarded unchanged.
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrlBlock {
    pub image_url: ImageUrl,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseBlock {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "empty_object")]
    pub input: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultBlock {
    #[serde(default)]
    pub tool_use_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingBlock {
    #[serde(default)]
    pub thinking: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactedThinkingBlock {
    #[serde(default)]
    pub data: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Decode a block body (without its `type` key) into a concrete block struct.
fn decode<T: DeserializeOwned>(body: &Map<String, Value>) -> Option<T> {
    let mut body = body.clone();
    body.remove("type");
    serde_json::from_value(Value::Object(body)).ok()
}

impl From<Value> for ContentBlock {
    fn from(value: Value) -> Self {
        let Value::Object(body) = value else {
            return Self::Other(value);
        };

        let tag = body.get("type").and_then(Value::as_str).map(str::to_owned);
        let decoded = match tag.as_deref() {
            Some("text") => decode(&body).map(Self::Text),
            Some("image_url") => decode(&body).map(Self::ImageUrl),
            Some("tool_use") => decode(&body).map(Self::ToolUse),
            Some("tool_result") => decode(&body).map(Self::ToolResult),
            Some("thinking") => decode(&body).map(Self::Thinking),
            Some("redacted_thinking") => decode(&body).map(Self::RedactedThinking),
            _ => None,
        };

        decoded.unwrap_or(Self::Other(Value::Object(body)))
    }
}

#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

impl Serialize for ContentBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(body) => Tagged { kind: "text", body }.serialize(serializer),
            Self::ImageUrl(body) => Tagged { kind: "image_url", body }.serialize(serializer),
            Self::ToolUse(body) => Tagged { kind: "tool_use", body }.serialize(serializer),
            Self::ToolResult(body) => Tagged { kind: "tool_result", body }.serialize(serializer),
            Self::Thinking(body) => Tagged { kind: "thinking", body }.serialize(serializer),
            Self::RedactedThinking(body) => Tagged {
                kind: "redacted_thinking",
                body,
            }
            .serialize(serializer),
            Self::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextBlock {
            text: text.into(),
            extra: Map::new(),
        })
    }

    /// The block's `type` tag, including for blocks kept as raw JSON.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Text(_) => Some("text"),
            Self::ImageUrl(_) => Some("image_url"),
            Self::ToolUse(_) => Some("tool_use"),
            Self::ToolResult(_) => Some("tool_result"),
            Self::Thinking(_) => Some("thinking"),
            Self::RedactedThinking(_) => Some("redacted_thinking"),
            Self::Other(value) => value.get("type").and_then(Value::as_str),
        }
    }

    /// Tagged `thinking` or `redacted_thinking`, decodable or not.
    #[must_use]
    pub fn is_reasoning(&self) -> bool {
        matches!(self.type_name(), Some("thinking" | "redacted_thinking"))
    }
}

// ---------------------------------------------------------------------------
// Tool definitions
// ---------------------------------------------------------------------------

/// A tool declared on the request, either an OpenAI function tool, an
/// Anthropic custom tool or a provider-defined tool (`computer_*`,
/// `web_search_*`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub kind: ToolKind,
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
    /// For function tools: extra top-level keys such as `cache_control`.
    /// For every other kind: the full definition as received.
    pub extra: Map<String, Value>,
}

fn default_input_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

fn string_field(body: &Map<String, Value>, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_owned)
}

impl ToolDefinition {
    /// A plain function tool in Anthropic form.
    pub fn function(
        name: impl Into<String>,
        description: Option<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            kind: ToolKind::Function,
            name: name.into(),
            description,
            input_schema,
            extra: Map::new(),
        }
    }

    /// A provider-defined tool kept exactly as given.
    #[must_use]
    pub fn provider(body: Map<String, Value>) -> Self {
        let tag = string_field(&body, "type").unwrap_or_default();
        Self {
            kind: ToolKind::from_type_tag(&tag),
            name: string_field(&body, "name").unwrap_or_default(),
            description: None,
            input_schema: Value::Null,
            extra: body,
        }
    }

    #[must_use]
    pub fn from_json(mut body: Map<String, Value>) -> Self {
        let tag = string_field(&body, "type");

        match tag.as_deref() {
            Some("function") if matches!(body.get("function"), Some(Value::Object(_))) => {
                let function = match body.remove("function") {
                    Some(Value::Object(function)) => function,
                    _ => Map::new(),
                };
                body.remove("type");
                Self {
                    kind: ToolKind::Function,
                    name: string_field(&function, "name").unwrap_or_default(),
                    description: string_field(&function, "description"),
                    input_schema: function
                        .get("parameters")
                        .cloned()
                        .unwrap_or_else(default_input_schema),
                    extra: body,
                }
            }
            None | Some("custom") => {
                body.remove("type");
                let name = string_field(&body, "name").unwrap_or_default();
                let description = string_field(&body, "description");
                body.remove("name");
                body.remove("description");
                let input_schema = body
                    .remove("input_schema")
                    .unwrap_or_else(default_input_schema);
                Self {
                    kind: ToolKind::Function,
                    name,
                    description,
                    input_schema,
                    extra: body,
                }
            }
            Some(_) => Self::provider(body),
        }
    }

    /// Wire form sent to Vertex.
    #[must_use]
    pub fn to_json(&self) -> Value {
        if self.kind != ToolKind::Function {
            return Value::Object(self.extra.clone());
        }

        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(ref description) = self.description {
            body.insert("description".to_string(), Value::String(description.clone()));
        }
        body.insert("input_schema".to_string(), self.input_schema.clone());
        for (key, value) in &self.extra {
            body.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(body)
    }
}

impl Serialize for ToolDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ToolDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(body) => Ok(Self::from_json(body)),
            other => Err(serde::de::Error::custom(format!(
                "tool definition must be an object, got {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool choice
// ---------------------------------------------------------------------------

/// Normalised tool-choice directive. Decoding never fails: shapes that are
/// not understood become [`ToolChoiceDirective::Malformed`]. Keys besides
/// the type and tool name (`disable_parallel_tool_use`, ...) ride along in
/// `extra`.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolChoiceDirective {
    Auto { extra: Map<String, Value> },
    Any { extra: Map<String, Value> },
    None { extra: Map<String, Value> },
    /// Force a specific tool. Only valid with a non-empty name.
    Tool {
        name: Option<String>,
        extra: Map<String, Value>,
    },
    Malformed(Value),
}

const DISABLE_PARALLEL_TOOL_USE: &str = "disable_parallel_tool_use";

impl ToolChoiceDirective {
    pub fn auto() -> Self {
        Self::Auto { extra: Map::new() }
    }

    pub fn any() -> Self {
        Self::Any { extra: Map::new() }
    }

    pub fn none() -> Self {
        Self::None { extra: Map::new() }
    }

    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool {
            name: Some(name.into()),
            extra: Map::new(),
        }
    }

    /// `{"type": "tool"}` with no usable name.
    pub fn unnamed_tool() -> Self {
        Self::Tool {
            name: None,
            extra: Map::new(),
        }
    }

    /// Whether the provider would accept this directive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Auto { .. } | Self::Any { .. } | Self::None { .. } => true,
            Self::Tool { name, .. } => name.as_deref().is_some_and(|n| !n.is_empty()),
            Self::Malformed(_) => false,
        }
    }

    /// Set `disable_parallel_tool_use`. `none` and malformed directives
    /// do not take it and are left alone.
    #[must_use]
    pub fn with_parallel_tool_use(mut self, parallel: bool) -> Self {
        match &mut self {
            Self::Auto { extra } | Self::Any { extra } | Self::Tool { extra, .. } => {
                extra.insert(DISABLE_PARALLEL_TOOL_USE.to_string(), Value::Bool(!parallel));
            }
            Self::None { .. } | Self::Malformed(_) => {}
        }
        self
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let (kind, name, extra) = match self {
            Self::Auto { extra } => ("auto", None, extra),
            Self::Any { extra } => ("any", None, extra),
            Self::None { extra } => ("none", None, extra),
            Self::Tool { name, extra } => ("tool", name.as_deref(), extra),
            Self::Malformed(raw) => return raw.clone(),
        };
        let mut body = Map::new();
        body.insert("type".to_string(), json!(kind));
        if let Some(name) = name {
            body.insert("name".to_string(), json!(name));
        }
        body.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Value::Object(body)
    }
}

fn nested_name(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|inner| inner.get("name"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Every key except the ones that encode the type and tool name.
fn directive_extra(value: &Value) -> Map<String, Value> {
    value
        .as_object()
        .map(|body| {
            body.iter()
                .filter(|(key, _)| !matches!(key.as_str(), "type" | "name" | "tool" | "function"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

impl From<Value> for ToolChoiceDirective {
    fn from(value: Value) -> Self {
        let kind = match &value {
            Value::String(s) => Some(s.as_str()),
            Value::Object(body) => body.get("type").and_then(Value::as_str),
            _ => None,
        };
        let extra = directive_extra(&value);

        match kind {
            Some("auto") => Self::Auto { extra },
            Some("any" | "required") => Self::Any { extra },
            Some("none") => Self::None { extra },
            Some("tool") if value.is_object() => {
                let name = nested_name(&value, "tool").or_else(|| {
                    value.get("name").and_then(Value::as_str).map(str::to_owned)
                });
                Self::Tool {
                    name: name.filter(|n| !n.is_empty()),
                    extra,
                }
            }
            Some("function") if value.is_object() => Self::Tool {
                name: nested_name(&value, "function").filter(|n| !n.is_empty()),
                extra,
            },
            _ => Self::Malformed(value),
        }
    }
}

impl Serialize for ToolChoiceDirective {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ToolChoiceDirective {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

// ---------------------------------------------------------------------------
// Request (what we send TO Vertex)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ThinkingConfig {
    Enabled { budget_tokens: u64 },
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemContent {
    Text(String),
    Blocks(Vec<SystemBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemBlock {
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cache_control: Option<Value>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Outbound payload for `rawPredict`. There is deliberately no `model` field:
/// Vertex binds the model through the endpoint URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesRequest {
    pub anthropic_version: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<Vec<SystemBlock>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoiceDirective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RequestMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_beta: Option<Vec<String>>,
    /// Caller parameters forwarded as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessagesRequest {
    #[must_use]
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Response (what Vertex sends back)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub response_type: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// Error body returned by Vertex. Both the Anthropic envelope
/// (`{"type":"error","error":{"type","message"}}`) and the Google one
/// (`{"error":{"code","message","status"}}`) carry `error.message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderErrorEnvelope {
    pub error: ProviderErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_block_round_trips_verbatim() {
        let raw = json!({"type": "container_upload", "file_id": "file_1"});
        let block: ContentBlock = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(block.type_name(), Some("container_upload"));
        assert_eq!(serde_json::to_value(&block).unwrap(), raw);
    }

    #[test]
    fn test_thinking_block_keeps_signature_and_extras() {
        let raw = json!({
            "type": "thinking",
            "thinking": "step one",
            "signature": "sig==",
            "cache_control": {"type": "ephemeral"}
        });
        let block: ContentBlock = serde_json::from_value(raw.clone()).unwrap();
        match &block {
            ContentBlock::Thinking(t) => {
                assert_eq!(t.thinking, "step one");
                assert_eq!(t.signature.as_deref(), Some("sig=="));
            }
            other => panic!("Expected thinking block, got {other:?}"),
        }
        assert!(block.is_reasoning());
        assert_eq!(serde_json::to_value(&block).unwrap(), raw);
    }

    #[test]
    fn test_openai_function_tool_serializes_in_anthropic_form() {
        let tool: ToolDefinition = serde_json::from_value(json!({
            "type": "function",
            "function": {
                "name": "get_weather",
                "description": "Weather lookup",
                "parameters": {"type": "object", "properties": {"city": {"type": "string"}}}
            }
        }))
        .unwrap();

        assert_eq!(tool.kind, ToolKind::Function);
        let wire = serde_json::to_value(&tool).unwrap();
        assert_eq!(wire["name"], "get_weather");
        assert_eq!(wire["description"], "Weather lookup");
        assert_eq!(wire["input_schema"]["properties"]["city"]["type"], "string");
        assert!(wire.get("type").is_none());
        assert!(wire.get("function").is_none());
    }

    #[test]
    fn test_provider_tool_passes_through() {
        let raw = json!({
            "type": "computer_20250124",
            "name": "computer",
            "display_width_px": 1024,
            "display_height_px": 768
        });
        let tool: ToolDefinition = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(
            tool.kind,
            ToolKind::ComputerUse {
                version: "computer_20250124".to_string()
            }
        );
        assert_eq!(tool.name, "computer");
        assert_eq!(serde_json::to_value(&tool).unwrap(), raw);
    }

    #[test]
    fn test_tool_choice_shapes() {
        let cases = [
            (json!("auto"), ToolChoiceDirective::auto()),
            (json!("required"), ToolChoiceDirective::any()),
            (json!("none"), ToolChoiceDirective::none()),
            (json!({"type": "any"}), ToolChoiceDirective::any()),
            (
                json!({"type": "function", "function": {"name": "lookup"}}),
                ToolChoiceDirective::tool("lookup"),
            ),
            (
                json!({"type": "tool", "tool": {"name": "lookup"}}),
                ToolChoiceDirective::tool("lookup"),
            ),
            (
                json!({"type": "tool", "name": "lookup"}),
                ToolChoiceDirective::tool("lookup"),
            ),
            (json!({"type": "tool"}), ToolChoiceDirective::unnamed_tool()),
            (
                json!({"type": "tool", "tool": {"name": ""}}),
                ToolChoiceDirective::unnamed_tool(),
            ),
        ];

        for (raw, expected) in cases {
            let parsed: ToolChoiceDirective = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(parsed, expected, "decoding {raw}");
        }
    }

    #[test]
    fn test_tool_choice_keeps_extra_keys() {
        for raw in [
            json!({"type": "auto", "disable_parallel_tool_use": true}),
            json!({"type": "any", "disable_parallel_tool_use": false}),
            json!({"type": "tool", "name": "lookup", "disable_parallel_tool_use": true}),
        ] {
            let parsed = ToolChoiceDirective::from(raw.clone());
            assert!(parsed.is_valid());
            assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
        }

        let nested = ToolChoiceDirective::from(json!({
            "type": "tool", "tool": {"name": "lookup"}, "disable_parallel_tool_use": true
        }));
        assert_eq!(
            nested.to_json(),
            json!({"type": "tool", "name": "lookup", "disable_parallel_tool_use": true})
        );
    }

    #[test]
    fn test_parallel_tool_use_flag() {
        assert_eq!(
            ToolChoiceDirective::auto().with_parallel_tool_use(false).to_json(),
            json!({"type": "auto", "disable_parallel_tool_use": true})
        );
        assert_eq!(
            ToolChoiceDirective::none().with_parallel_tool_use(false),
            ToolChoiceDirective::none()
        );
    }

    #[test]
    fn test_tool_choice_validity() {
        assert!(ToolChoiceDirective::auto().is_valid());
        assert!(ToolChoiceDirective::tool("x").is_valid());
        assert!(!ToolChoiceDirective::unnamed_tool().is_valid());
        assert!(!ToolChoiceDirective::Malformed(json!(42)).is_valid());
        assert_eq!(
            serde_json::to_value(ToolChoiceDirective::tool("x")).unwrap(),
            json!({"type": "tool", "name": "x"})
        );
    }

    #[test]
    fn test_thinking_config_wire_shape() {
        let config = ThinkingConfig::Enabled {
            budget_tokens: 4000,
        };
        assert_eq!(
            serde_json::to_value(config).unwrap(),
            json!({"type": "enabled", "budget_tokens": 4000})
        );
    }
}
