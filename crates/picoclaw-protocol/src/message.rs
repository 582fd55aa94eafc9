//! Chat message types: roles, tool calls, model responses, tool results.

use serde::{Deserialize, Serialize};

/// Conversation role. Serializes as the lowercase name.
///
/// Unknown role strings decode to [`Role::User`] so that a shell speaking a
/// newer dialect never produces a parse failure in the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }

    /// Parse a role name; anything unrecognized maps to `User`.
    pub fn parse(value: &str) -> Self {
        match value {
            "assistant" => Role::Assistant,
            "system" => Role::System,
            "tool" => Role::Tool,
            _ => Role::User,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_owned()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model-requested function invocation. `arguments` is a JSON document
/// carried as opaque text; the core never parses it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// A tool call as it appears in an assistant message.
///
/// `name` is denormalized from `function.name`; when both are present they
/// must agree. [`ToolCall::tool_name`] prefers the function form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "function_call_type")]
    pub call_type: String,
    #[serde(default)]
    pub function: Option<FunctionCall>,
    #[serde(default)]
    pub name: String,
}

fn function_call_type() -> String {
    "function".to_owned()
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            call_type: function_call_type(),
            function: Some(FunctionCall {
                name: name.clone(),
                arguments: arguments.into(),
            }),
            name,
        }
    }

    /// Effective tool name: the function form wins when present.
    pub fn tool_name(&self) -> &str {
        match &self.function {
            Some(f) if !f.name.is_empty() => &f.name,
            _ => &self.name,
        }
    }

    /// Opaque argument text, empty when no function payload was supplied.
    pub fn arguments(&self) -> &str {
        self.function.as_ref().map_or("", |f| f.arguments.as_str())
    }
}

/// Token accounting reported by the model provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInfo {
    #[serde(default)]
    pub prompt: u64,
    #[serde(default)]
    pub completion: u64,
    #[serde(default)]
    pub total: u64,
}

/// A single conversation message.
///
/// Invariants: a `Tool` message carries a non-empty `tool_call_id`; only
/// `Assistant` messages carry `tool_calls`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reasoning_content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub tool_call_id: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            ..Self::default()
        }
    }

    /// A tool-result message correlated to the originating call.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: tool_call_id.into(),
            ..Self::default()
        }
    }
}

/// Shell reply to an `llm_call` callback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LLMResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reasoning_content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub usage: Option<UsageInfo>,
}

impl LLMResponse {
    /// The assistant message this response contributes to the window.
    pub fn to_message(&self) -> Message {
        Message {
            role: Role::Assistant,
            content: self.content.clone(),
            reasoning_content: self.reasoning_content.clone(),
            tool_calls: self.tool_calls.clone(),
            tool_call_id: String::new(),
        }
    }
}

/// Shell reply to an `execute_tool` callback.
///
/// `cost_cents` is the per-call spend charged against the campaign budget;
/// shells that do not meter report zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    #[serde(default)]
    pub for_llm: String,
    #[serde(default)]
    pub for_user: String,
    #[serde(default)]
    pub silent: bool,
    #[serde(default)]
    pub is_error: bool,
    #[serde(rename = "async", default)]
    pub is_async: bool,
    #[serde(default)]
    pub cost_cents: u64,
}

/// A tool advertised to the model. `parameters` is an opaque JSON schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: String,
}
