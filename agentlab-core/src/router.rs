//! Delegation of tool calls to remote agents
//!
//! The orchestrator agent is given a single function tool,
//! `delegate_to_agent(agent_name, task)`. Each call is matched against the
//! [`AgentRegistry`] by exact name and the task text is sent to that agent.
//! Routing never fails: unknown agents, bad arguments and remote errors all
//! become a JSON error object in the call's output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::a2a::{AgentRegistry, RemoteTransport};
use crate::error::{LabError, Result};
use crate::orchestrator::{ToolCallHandler, unknown_function_output};
use crate::runtime::{ToolCall, ToolDefinition, ToolOutput};

/// Name of the delegation function tool
pub const DELEGATE_TOOL_NAME: &str = "delegate_to_agent";

/// Function tool definition registered on the orchestrator agent
pub fn delegate_tool_definition() -> ToolDefinition {
    ToolDefinition::function(
        DELEGATE_TOOL_NAME,
        "Send a task to a remote A2A agent by name and return its reply.",
        json!({
            "type": "object",
            "properties": {
                "agent_name": {
                    "type": "string",
                    "description": "Exact name of a discovered remote agent"
                },
                "task": {
                    "type": "string",
                    "description": "Task text to send to the agent"
                }
            },
            "required": ["agent_name", "task"]
        }),
    )
}

#[derive(Debug, Deserialize)]
struct DelegateArguments {
    agent_name: String,
    #[serde(default)]
    task: String,
}

/// A delegation request extracted from a run's tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToolCall {
    pub call_id: String,
    pub target_agent_name: String,
    pub payload: String,
}

impl PendingToolCall {
    pub fn new(
        call_id: impl Into<String>,
        target_agent_name: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            target_agent_name: target_agent_name.into(),
            payload: payload.into(),
        }
    }

    /// Parse the `{agent_name, task}` arguments of a delegation call.
    ///
    /// Surrounding whitespace is stripped from the agent name; matching stays
    /// exact.
    pub fn from_tool_call(call: &ToolCall) -> Result<Self> {
        let arguments = call.arguments()?;
        let parsed: DelegateArguments = serde_json::from_value(arguments)?;
        Ok(Self::new(call.id.clone(), parsed.agent_name.trim(), parsed.task))
    }
}

/// Output produced for one pending call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub call_id: String,
    pub output: String,
}

impl From<ToolResult> for ToolOutput {
    fn from(result: ToolResult) -> Self {
        ToolOutput::new(result.call_id, result.output)
    }
}

/// Route a call, surfacing failures as errors
pub async fn try_route(
    call: &PendingToolCall,
    registry: &AgentRegistry,
    transport: &dyn RemoteTransport,
) -> Result<ToolResult> {
    let descriptor =
        registry
            .get(&call.target_agent_name)
            .ok_or_else(|| LabError::UnknownAgent {
                requested: call.target_agent_name.clone(),
                known: registry.names().into_iter().map(String::from).collect(),
            })?;

    let output = transport.send_message(descriptor, &call.payload).await?;
    Ok(ToolResult {
        call_id: call.call_id.clone(),
        output,
    })
}

/// Route a call to its remote agent.
///
/// The result always carries the call's id; on failure its output is a JSON
/// error object.
pub async fn route(
    call: &PendingToolCall,
    registry: &AgentRegistry,
    transport: &dyn RemoteTransport,
) -> ToolResult {
    match try_route(call, registry, transport).await {
        Ok(result) => {
            info!(agent = %call.target_agent_name, call_id = %call.call_id, "Delegated task");
            result
        }
        Err(e) => {
            warn!(agent = %call.target_agent_name, call_id = %call.call_id, error = %e, "Delegation failed");
            ToolResult {
                call_id: call.call_id.clone(),
                output: error_output(&e),
            }
        }
    }
}

fn error_output(err: &LabError) -> String {
    let body = match err {
        LabError::UnknownAgent { requested, known } => json!({
            "error": "Unknown agent",
            "requested": requested,
            "known": known,
            "hint": "Use one of the known agent names exactly as listed.",
        }),
        other => json!({ "error": other.to_string() }),
    };
    body.to_string()
}

/// Tool call handler serving `delegate_to_agent`
#[derive(Clone)]
pub struct Router {
    registry: Arc<AgentRegistry>,
    transport: Arc<dyn RemoteTransport>,
}

impl Router {
    pub fn new(registry: Arc<AgentRegistry>, transport: Arc<dyn RemoteTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Route one pending call
    pub async fn route(&self, call: &PendingToolCall) -> ToolResult {
        route(call, &self.registry, self.transport.as_ref()).await
    }

    async fn handle_call(&self, call: &ToolCall) -> ToolOutput {
        if call.function.name != DELEGATE_TOOL_NAME {
            return unknown_function_output(call);
        }

        match PendingToolCall::from_tool_call(call) {
            Ok(pending) => self.route(&pending).await.into(),
            Err(e) => {
                warn!(call_id = %call.id, error = %e, "Invalid delegate_to_agent arguments");
                ToolOutput::new(
                    call.id.clone(),
                    json!({ "error": format!("Invalid arguments: {e}") }).to_string(),
                )
            }
        }
    }
}

#[async_trait]
impl ToolCallHandler for Router {
    async fn handle(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            outputs.push(self.handle_call(call).await);
        }
        outputs
    }
}
