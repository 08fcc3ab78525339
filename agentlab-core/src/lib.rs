//! # agentlab - Hosted agents that delegate over A2A and MCP
//!
//! agentlab drives agents on a hosted, assistants-style agent runtime and
//! connects them to the outside world:
//! - A run loop that polls runs and answers `requires_action` tool calls
//! - Agent-to-Agent (A2A) discovery of remote agents from their agent cards
//! - A router that serves `delegate_to_agent` by exact agent name
//! - An MCP bridge exposing a server's tools as function tools
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agentlab_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = LabConfig::load()?;
//!     let ctx = LabContext::from_config(&config);
//!     let transport = Arc::new(HttpTransport::new(config.remote_agents.request_timeout)?);
//!
//!     let report = a2a_orchestrator(&ctx, &config.remote_agents.urls, transport, BLOG_PROMPT).await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **runtime**: [`runtime::AgentRuntime`] seam and its REST client
//! - **a2a**: agent cards, the [`a2a::AgentRegistry`] and the HTTP transport
//! - **router**: tool calls to remote agents, failures as JSON error outputs
//! - **orchestrator**: the run-driving state machine
//! - **mcp**: streamable HTTP client and tool bridge
//! - **labs**: the runnable scenarios behind the CLI

pub mod a2a;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod labs;
pub mod mcp;
pub mod orchestrator;
pub mod router;
pub mod runtime;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::a2a::{
        AgentCard, AgentDescriptor, AgentRegistry, HttpTransport, RemoteTransport, resolve,
    };
    pub use crate::config::{LabConfig, McpConfig, PollingConfig, RemoteAgentsConfig, RuntimeConfig};
    pub use crate::error::{LabError, Result};
    pub use crate::labs::{
        BLOG_PROMPT, LabContext, LabReport, McpLab, a2a_orchestrator, mcp_bridge, multi_agent,
        single_agent,
    };
    pub use crate::mcp::{McpBridge, McpClient, McpTool, McpToolClient};
    pub use crate::orchestrator::{
        LoopPhase, NoTools, Orchestrator, RunPolicy, ToolCallHandler, create_and_process,
        drive_run,
    };
    pub use crate::router::{
        DELEGATE_TOOL_NAME, PendingToolCall, Router, ToolResult, delegate_tool_definition, route,
    };
    pub use crate::runtime::{
        AgentDefinition, AgentRuntime, HttpAgentRuntime, MessageRole, Run, RunStatus, ToolCall,
        ToolDefinition, ToolOutput,
    };
}
