//! Wire types of the hosted agent runtime
//!
//! These mirror the JSON objects returned by the runtime's REST surface
//! (agents, threads, messages, runs). Only the fields the labs consume are
//! modelled; unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition sent when creating an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Model deployment name
    pub model: String,
    /// Agent name
    pub name: String,
    /// System instructions
    pub instructions: String,
    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

impl AgentDefinition {
    pub fn new(
        model: impl Into<String>,
        name: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
            instructions: instructions.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = ToolDefinition>) -> Self {
        self.tools.extend(tools);
        self
    }
}

/// An agent created on the runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Tool exposed to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDefinition {
    /// Caller-executed function tool
    Function { function: FunctionDefinition },
    /// Runtime-hosted code interpreter
    CodeInterpreter,
}

impl ToolDefinition {
    /// Build a function tool from a name, description and JSON Schema
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        ToolDefinition::Function {
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// Function name, if this is a function tool
    pub fn function_name(&self) -> Option<&str> {
        match self {
            ToolDefinition::Function { function } => Some(&function.name),
            ToolDefinition::CodeInterpreter => None,
        }
    }
}

/// Function signature advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: Value,
}

/// A conversation thread, referenced by id only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
}

/// Author of a thread message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message stored in a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ThreadMessage {
    /// Text parts of the message, in order
    pub fn text_parts(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|c| match c {
            MessageContent::Text { text } => Some(text.value.as_str()),
            _ => None,
        })
    }

    /// The last text part of the message
    pub fn last_text(&self) -> Option<&str> {
        self.text_parts().last()
    }

    /// All text parts joined by newlines
    pub fn text(&self) -> String {
        self.text_parts().collect::<Vec<_>>().join("\n")
    }
}

/// One content part of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    ImageFile { image_file: ImageFile },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFile {
    pub file_id: String,
}

/// Sort order for message listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    Asc,
    Desc,
}

impl ListOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOrder::Asc => "asc",
            ListOrder::Desc => "desc",
        }
    }
}

/// Envelope of list endpoints
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub data: Vec<T>,
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    /// The run is still working and should be polled again
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling
        )
    }

    /// The run ended without completing
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled | RunStatus::Failed | RunStatus::Expired | RunStatus::Incomplete
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One execution of an agent against a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default, alias = "agent_id")]
    pub assistant_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl Run {
    /// Tool calls awaiting output, empty unless the run requires action
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        self.required_action
            .as_ref()
            .and_then(|a| a.submit_tool_outputs.as_ref())
            .map(|s| s.tool_calls.as_slice())
            .unwrap_or_default()
    }

    /// Human readable error of a failed run
    pub fn error_message(&self) -> Option<String> {
        self.last_error
            .as_ref()
            .map(|e| match &e.code {
                Some(code) => format!("{}: {}", code, e.message),
                None => e.message.clone(),
            })
    }
}

/// Action the caller must take before the run proceeds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub submit_tool_outputs: Option<SubmitToolOutputs>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// A tool call emitted by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_tool_call_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn default_tool_call_kind() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: default_tool_call_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Parsed JSON arguments; an empty string is an empty object
    pub fn arguments(&self) -> serde_json::Result<Value> {
        if self.function.arguments.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&self.function.arguments)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Output for one tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

impl ToolOutput {
    pub fn new(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            output: output.into(),
        }
    }
}

/// Error recorded on a failed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}
