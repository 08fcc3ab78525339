//! Error types for agentlab operations

use crate::runtime::RunStatus;

/// Result type for agentlab operations
pub type Result<T> = std::result::Result<T, LabError>;

/// Error types for the labs, the router and the hosted runtime client
#[derive(Debug, thiserror::Error)]
pub enum LabError {
    /// Configuration error (missing or invalid environment values)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A remote agent descriptor could not be resolved
    #[error("Discovery failed for {url}: {reason}")]
    Discovery { url: String, reason: String },

    /// A tool call named an agent that is not in the registry
    #[error("Unknown agent '{requested}' (known: {})", known.join(", "))]
    UnknownAgent {
        requested: String,
        known: Vec<String>,
    },

    /// The HTTP call to a remote agent failed
    #[error("Remote invocation of '{agent}' failed: {reason}")]
    RemoteInvocation { agent: String, reason: String },

    /// A hosted run ended in failed, expired or cancelled
    #[error("Run {run_id} ended with status {status}: {}", message.as_deref().unwrap_or("no error details"))]
    RunTerminal {
        run_id: String,
        status: RunStatus,
        message: Option<String>,
    },

    /// A run did not reach a final state within the poll budget
    #[error("Run {run_id} still pending after {polls} polls")]
    PollLimit { run_id: String, polls: usize },

    /// A thread still carries a run abandoned at the poll limit
    #[error("Thread {thread_id} still has run {run_id} in flight")]
    ThreadBusy { thread_id: String, run_id: String },

    /// The hosted runtime rejected a request
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// MCP session or tool error
    #[error("MCP error: {0}")]
    Mcp(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for LabError {
    fn from(s: String) -> Self {
        LabError::Other(s)
    }
}

impl From<&str> for LabError {
    fn from(s: &str) -> Self {
        LabError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for LabError {
    fn from(err: anyhow::Error) -> Self {
        LabError::Other(err.to_string())
    }
}
