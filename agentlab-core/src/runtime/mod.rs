//! Hosted agent runtime client
//!
//! The runtime owns agents, threads and runs. This module only consumes it:
//! [`AgentRuntime`] is the seam the orchestrator loop and the labs talk to,
//! [`HttpAgentRuntime`] is the REST implementation.

mod http;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpAgentRuntime;
pub use types::{
    Agent, AgentDefinition, FunctionCall, FunctionDefinition, ImageFile, ListOrder,
    MessageContent, MessageRole, RequiredAction, Run, RunError, RunStatus, SubmitToolOutputs,
    TextContent, Thread, ThreadMessage, ToolCall, ToolDefinition, ToolOutput,
};

use async_trait::async_trait;

use crate::error::Result;

/// Operations of the hosted agent runtime used by the labs
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Create an agent definition
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<Agent>;

    /// Delete an agent definition
    async fn delete_agent(&self, agent_id: &str) -> Result<()>;

    /// Create an empty thread
    async fn create_thread(&self) -> Result<Thread>;

    /// Append a message to a thread
    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage>;

    /// List the messages of a thread
    async fn list_messages(&self, thread_id: &str, order: ListOrder) -> Result<Vec<ThreadMessage>>;

    /// Start a run of an agent against a thread
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run>;

    /// Fetch the current state of a run
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Answer the pending tool calls of a run in one batch
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run>;
}
