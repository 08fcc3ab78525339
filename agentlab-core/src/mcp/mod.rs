//! Model Context Protocol (MCP) client and bridge
//!
//! Connects to an MCP server over streamable HTTP and exposes its tools to a
//! hosted agent as function tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use agentlab_core::mcp::{McpBridge, McpClient};
//!
//! let client = Arc::new(McpClient::connect("http://127.0.0.1:8765/mcp", timeout).await?);
//! let bridge = McpBridge::discover(client, "weather").await?;
//! let definition = AgentDefinition::new(model, "mcp-bridge", instructions)
//!     .with_tools(bridge.tool_definitions());
//! ```
//!
//! # Protocol Overview
//!
//! Only the client half of the protocol is used:
//! - `initialize` / `notifications/initialized` - Connection setup
//! - `tools/list` - List available tools
//! - `tools/call` - Call a tool
//!
//! # References
//!
//! - [MCP Specification](https://modelcontextprotocol.io/specification)

mod bridge;
mod client;
mod protocol;

pub use bridge::{McpBridge, to_tool_definition};
pub use client::{McpClient, McpToolClient, SESSION_HEADER, parse_response};
pub use protocol::*;
