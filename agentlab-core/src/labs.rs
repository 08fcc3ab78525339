//! Lab runners
//!
//! Each lab creates its agents on the hosted runtime, drives one or more
//! runs and always deletes the agents again before returning a
//! [`LabReport`].

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::a2a::{RemoteTransport, resolve};
use crate::config::LabConfig;
use crate::error::{LabError, Result};
use crate::mcp::{McpBridge, McpToolClient};
use crate::orchestrator::{NoTools, Orchestrator, RunPolicy, ToolCallHandler, create_and_process};
use crate::router::{Router, delegate_tool_definition};
use crate::runtime::{
    AgentDefinition, AgentRuntime, HttpAgentRuntime, ListOrder, MessageRole, RunStatus,
    ToolDefinition,
};

pub const SINGLE_AGENT_PROMPT: &str = "Plot the line y = 4x + 9 and show it as a PNG.";

pub const RESEARCH_PROMPT: &str = "Assume we have a sample CSV. Run a simple time-series \
    analysis and find the three most important insights. Use code for the calculations if needed.";

pub const HANDOFF_PROMPT: &str = "Writer, based on the research above, write a five-sentence \
    executive summary and three action items. Clearly mark anything that is uncertain.";

pub const WEATHER_PROMPT: &str = "Using the provided tools, summarize the current forecast for \
    San Francisco, CA (latitude 37.7749, longitude -122.4194). If possible, include the next two \
    forecast periods as well.";

pub const MSLEARN_PROMPT: &str =
    "How do I create an agent with tools using the Azure AI Agents SDK? Point me to the relevant docs.";

pub const BLOG_PROMPT: &str = "Create a catchy blog title for 'React programming' and a short \
    outline. Use the appropriate remote agent(s).";

/// Shared handles for running labs against one runtime
#[derive(Clone)]
pub struct LabContext {
    runtime: Arc<dyn AgentRuntime>,
    model: String,
    policy: RunPolicy,
}

impl LabContext {
    pub fn new(runtime: Arc<dyn AgentRuntime>, model: impl Into<String>, policy: RunPolicy) -> Self {
        Self {
            runtime,
            model: model.into(),
            policy,
        }
    }

    /// Context backed by the REST runtime described in `config`
    pub fn from_config(config: &LabConfig) -> Self {
        Self::new(
            Arc::new(HttpAgentRuntime::from_config(&config.runtime)),
            config.runtime.model.clone(),
            RunPolicy::from(&config.polling),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn definition(&self, name: &str, instructions: &str) -> AgentDefinition {
        AgentDefinition::new(self.model.clone(), name, instructions)
    }

    async fn delete_agent(&self, agent_id: &str) {
        match self.runtime.delete_agent(agent_id).await {
            Ok(()) => info!(agent_id, "Deleted agent"),
            Err(e) => warn!(agent_id, error = %e, "Failed to delete agent"),
        }
    }

    /// Run `agent_id` on `thread_id`; a failed run is reported, not raised
    async fn process(
        &self,
        thread_id: &str,
        agent_id: &str,
        agent_name: &str,
        handler: &dyn ToolCallHandler,
    ) -> Result<RunSummary> {
        let outcome = create_and_process(
            self.runtime.as_ref(),
            thread_id,
            agent_id,
            handler,
            &self.policy,
        )
        .await;

        match outcome {
            Ok(run) => Ok(RunSummary {
                agent: agent_name.to_string(),
                run_id: run.id,
                status: run.status,
                error: None,
            }),
            Err(LabError::RunTerminal {
                run_id,
                status,
                message,
            }) => Ok(RunSummary {
                agent: agent_name.to_string(),
                run_id,
                status,
                error: Some(message.unwrap_or_else(|| "no error details".to_string())),
            }),
            Err(e) => Err(e),
        }
    }

    async fn transcript(&self, thread_id: &str) -> Result<Vec<TranscriptEntry>> {
        let messages = self.runtime.list_messages(thread_id, ListOrder::Asc).await?;
        Ok(messages
            .iter()
            .map(|m| TranscriptEntry {
                role: m.role,
                text: m.text(),
            })
            .collect())
    }
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub agent: String,
    pub run_id: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub role: MessageRole,
    pub text: String,
}

/// What a lab did, for printing
#[derive(Debug, Clone, Default, Serialize)]
pub struct LabReport {
    pub lab: String,
    pub runs: Vec<RunSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remote_agents: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transcript: Vec<TranscriptEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

impl LabReport {
    fn new(lab: &str) -> Self {
        Self {
            lab: lab.to_string(),
            ..Default::default()
        }
    }
}

impl fmt::Display for LabReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.lab)?;
        if !self.remote_agents.is_empty() {
            writeln!(f, "Remote agents: {}", self.remote_agents.join(", "))?;
        }
        if !self.tools.is_empty() {
            writeln!(f, "Tools: {}", self.tools.join(", "))?;
        }
        for run in &self.runs {
            write!(f, "Run {} ({}): {}", run.run_id, run.agent, run.status)?;
            match &run.error {
                Some(error) => writeln!(f, " - {error}")?,
                None => writeln!(f)?,
            }
        }
        if !self.transcript.is_empty() {
            writeln!(f, "=== Messages ===")?;
            for entry in &self.transcript {
                writeln!(f, "[{}] {}", entry.role, entry.text)?;
            }
        }
        if let Some(reply) = &self.reply {
            writeln!(f, "{reply}")?;
        }
        Ok(())
    }
}

/// One agent with the code interpreter answers a single prompt
pub async fn single_agent(ctx: &LabContext, prompt: &str) -> Result<LabReport> {
    let definition = ctx
        .definition(
            "single-agent-demo",
            "You politely help with math and data visualization. \
             Use code when needed and return a brief explanation.",
        )
        .with_tool(ToolDefinition::CodeInterpreter);
    let agent = ctx.runtime.create_agent(&definition).await?;
    info!(agent_id = %agent.id, "Created agent");

    let outcome = async {
        let thread = ctx.runtime.create_thread().await?;
        ctx.runtime
            .create_message(&thread.id, MessageRole::User, prompt)
            .await?;

        let mut report = LabReport::new("single-agent");
        report
            .runs
            .push(ctx.process(&thread.id, &agent.id, &definition.name, &NoTools).await?);
        report.transcript = ctx.transcript(&thread.id).await?;
        Ok::<_, LabError>(report)
    }
    .await;

    ctx.delete_agent(&agent.id).await;
    outcome
}

/// A researcher and a writer take turns on one shared thread
pub async fn multi_agent(ctx: &LabContext, research: &str, handoff: &str) -> Result<LabReport> {
    let researcher_definition = ctx
        .definition(
            "researcher",
            "You are a detail-oriented research agent. Analyze data and produce structured \
             findings. Use code for analysis when needed.",
        )
        .with_tool(ToolDefinition::CodeInterpreter);
    let writer_definition = ctx
        .definition(
            "writer",
            "You are a clear and concise writer. Given research findings in the thread, \
             produce a polished executive summary with action items.",
        )
        .with_tool(ToolDefinition::CodeInterpreter);

    let researcher = ctx.runtime.create_agent(&researcher_definition).await?;
    let writer = match ctx.runtime.create_agent(&writer_definition).await {
        Ok(writer) => writer,
        Err(e) => {
            ctx.delete_agent(&researcher.id).await;
            return Err(e);
        }
    };
    info!(researcher = %researcher.id, writer = %writer.id, "Created agents");

    let outcome = async {
        let thread = ctx.runtime.create_thread().await?;
        let mut report = LabReport::new("multi-agent");

        ctx.runtime
            .create_message(&thread.id, MessageRole::User, research)
            .await?;
        report.runs.push(
            ctx.process(&thread.id, &researcher.id, &researcher_definition.name, &NoTools)
                .await?,
        );

        ctx.runtime
            .create_message(&thread.id, MessageRole::User, handoff)
            .await?;
        report.runs.push(
            ctx.process(&thread.id, &writer.id, &writer_definition.name, &NoTools)
                .await?,
        );

        report.transcript = ctx.transcript(&thread.id).await?;
        Ok::<_, LabError>(report)
    }
    .await;

    ctx.delete_agent(&researcher.id).await;
    ctx.delete_agent(&writer.id).await;
    outcome
}

/// Server label, agent name, instructions and prompt of an MCP bridge lab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpLab {
    pub label: String,
    pub agent_name: String,
    pub instructions: String,
    pub prompt: String,
}

impl McpLab {
    /// Bridge to a local MCP server under `label`
    pub fn local(label: &str, prompt: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            agent_name: label.to_string(),
            instructions: "This agent can use tools bridged from a local MCP server. Call those \
                functions when needed and answer the user's question from their results."
                .to_string(),
            prompt: prompt.into(),
        }
    }

    /// Bridge to the public Microsoft Learn MCP server
    pub fn mslearn(prompt: impl Into<String>) -> Self {
        Self {
            label: "mslearn".to_string(),
            agent_name: "mslearn-mcp-agent".to_string(),
            instructions: "You are an assistant with access to Microsoft Learn documentation. \
                Use the provided tools to search Microsoft technical documentation and give \
                accurate, helpful answers."
                .to_string(),
            prompt: prompt.into(),
        }
    }
}

/// Expose an MCP server's tools to an agent and answer one prompt
pub async fn mcp_bridge(
    ctx: &LabContext,
    client: Arc<dyn McpToolClient>,
    lab: &McpLab,
) -> Result<LabReport> {
    let bridge = McpBridge::discover(client, &lab.label).await?;
    let definition = ctx
        .definition(&lab.agent_name, &lab.instructions)
        .with_tools(bridge.tool_definitions());

    let mut report = LabReport::new("mcp-bridge");
    report.tools = bridge.tools().iter().map(|t| t.name.clone()).collect();

    let mut orchestrator = Orchestrator::start(
        ctx.runtime.clone(),
        &definition,
        Arc::new(bridge),
        ctx.policy.clone(),
    )
    .await?;
    let outcome = orchestrator.turn(&lab.prompt).await;
    orchestrator.shutdown().await;

    report.reply = outcome?;
    Ok(report)
}

/// Instructions for the orchestrator agent, listing the exact agent names
pub fn orchestrator_instructions(names: &[&str]) -> String {
    let known = if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    };
    format!(
        "You delegate tasks to remote agents discovered via A2A.\n\
         Known remote agents: {known}. Use delegate_to_agent(agent_name, task) with one of these exact names.\n\
         If unsure which to use, first pick based on the user's request."
    )
}

/// Discover remote agents and let an orchestrator agent delegate to them
pub async fn a2a_orchestrator(
    ctx: &LabContext,
    urls: &[String],
    transport: Arc<dyn RemoteTransport>,
    prompt: &str,
) -> Result<LabReport> {
    let registry = resolve(urls, transport.as_ref()).await;
    let names: Vec<String> = registry.names().into_iter().map(String::from).collect();
    if registry.is_empty() {
        warn!("No remote agents discovered; the orchestrator will run but cannot route");
    } else {
        info!(agents = %names.join(", "), "Available remote agents");
    }

    let instructions = orchestrator_instructions(&registry.names());
    let definition = ctx
        .definition("a2a-orchestrator", &instructions)
        .with_tool(delegate_tool_definition());
    let router = Router::new(Arc::new(registry), transport);

    let mut report = LabReport::new("a2a-orchestrator");
    report.remote_agents = names;

    let mut orchestrator = Orchestrator::start(
        ctx.runtime.clone(),
        &definition,
        Arc::new(router),
        ctx.policy.clone(),
    )
    .await?;
    let outcome = orchestrator.turn(prompt).await;
    orchestrator.shutdown().await;

    report.reply = outcome?;
    Ok(report)
}
