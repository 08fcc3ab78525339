//! Expose MCP server tools as runtime function tools
//!
//! Each MCP tool becomes a function tool with the same name, description and
//! input schema. When a run asks for one of them, the bridge calls the tool
//! on the MCP server and answers with the joined text blocks of the result.
//! Neither the description nor the output is ever empty.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use super::client::McpToolClient;
use super::protocol::McpTool;
use crate::error::Result;
use crate::orchestrator::{ToolCallHandler, unknown_function_output};
use crate::runtime::{ToolCall, ToolDefinition, ToolOutput};

/// Output sent back when a tool result carries no text
pub const NO_RESULTS: &str = "No results.";

/// Function tool definition mirroring an MCP tool.
///
/// A missing input schema becomes an empty object schema and a missing
/// description becomes `"{label} tool: {name}"`.
pub fn to_tool_definition(tool: &McpTool, label: &str) -> ToolDefinition {
    let parameters = match &tool.input_schema {
        Value::Object(schema) if !schema.is_empty() => tool.input_schema.clone(),
        _ => json!({ "type": "object", "properties": {} }),
    };
    let description = match tool.description.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!("{label} tool: {}", tool.name),
    };
    ToolDefinition::function(tool.name.clone(), description, parameters)
}

/// Tool call handler forwarding calls to an MCP session
pub struct McpBridge {
    client: Arc<dyn McpToolClient>,
    label: String,
    tools: Vec<McpTool>,
}

impl McpBridge {
    /// List the server's tools and build a bridge over them
    pub async fn discover(client: Arc<dyn McpToolClient>, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let tools = client.list_tools().await?;
        info!(
            server = %label,
            tools = ?tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "Bridging MCP tools"
        );
        Ok(Self {
            client,
            label,
            tools,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tools(&self) -> &[McpTool] {
        &self.tools
    }

    /// Function tool definitions to register on the agent
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| to_tool_definition(tool, &self.label))
            .collect()
    }

    fn serves(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    async fn call(&self, call: &ToolCall) -> ToolOutput {
        if !self.serves(&call.function.name) {
            return unknown_function_output(call);
        }

        let arguments = match call.arguments() {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(tool = %call.function.name, error = %e, "Invalid tool arguments");
                return error_output(call, format!("Invalid arguments: {e}"));
            }
        };

        match self.client.call_tool(&call.function.name, arguments).await {
            Ok(result) => {
                if result.is_error() {
                    warn!(tool = %call.function.name, "MCP tool reported an error");
                }
                let text = result.text();
                if text.is_empty() {
                    ToolOutput::new(call.id.clone(), NO_RESULTS)
                } else {
                    ToolOutput::new(call.id.clone(), text)
                }
            }
            Err(e) => {
                warn!(tool = %call.function.name, error = %e, "MCP tool call failed");
                error_output(call, e.to_string())
            }
        }
    }
}

fn error_output(call: &ToolCall, message: String) -> ToolOutput {
    ToolOutput::new(call.id.clone(), json!({ "error": message }).to_string())
}

#[async_trait]
impl ToolCallHandler for McpBridge {
    async fn handle(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            outputs.push(self.call(call).await);
        }
        outputs
    }
}
