//! Run-driving loop
//!
//! An [`Orchestrator`] owns one agent definition and one thread on the hosted
//! runtime. Each [`Orchestrator::turn`] posts the user input, starts a run and
//! polls it until it finishes. When the run stops in `requires_action`, every
//! pending tool call goes to a [`ToolCallHandler`] and all outputs are
//! submitted together before polling resumes.
//!
//! # Example
//!
//! ```rust,ignore
//! let router = Arc::new(Router::new(registry, transport));
//! let mut orchestrator = Orchestrator::start(runtime, &definition, router, RunPolicy::default()).await?;
//! let reply = orchestrator.turn("Draft a blog post about edge AI").await?;
//! orchestrator.shutdown().await;
//! ```

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::PollingConfig;
use crate::error::{LabError, Result};
use crate::runtime::{
    AgentDefinition, AgentRuntime, ListOrder, MessageRole, Run, RunStatus, ThreadMessage,
    ToolCall, ToolOutput,
};

/// Answers the tool calls a run is waiting on.
///
/// Implementations never fail: a call that cannot be served gets an output
/// describing the error so the model can react to it.
#[async_trait]
pub trait ToolCallHandler: Send + Sync {
    /// Produce one output per call, in call order
    async fn handle(&self, calls: &[ToolCall]) -> Vec<ToolOutput>;
}

/// Handler for agents without caller-executed tools
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTools;

#[async_trait]
impl ToolCallHandler for NoTools {
    async fn handle(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        calls.iter().map(unknown_function_output).collect()
    }
}

/// Output for a call naming a function the handler does not serve
pub fn unknown_function_output(call: &ToolCall) -> ToolOutput {
    warn!(function = %call.function.name, call_id = %call.id, "Unknown function requested by run");
    ToolOutput::new(
        call.id.clone(),
        json!({ "error": "Unknown function", "function": call.function.name }).to_string(),
    )
}

/// Polling behavior of the run loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPolicy {
    /// Delay between two status polls
    pub poll_interval: Duration,
    /// Give up after this many polls of one run
    pub max_polls: Option<usize>,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_polls: None,
        }
    }
}

impl RunPolicy {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: usize) -> Self {
        self.max_polls = Some(max_polls);
        self
    }
}

impl From<&PollingConfig> for RunPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            poll_interval: config.interval,
            max_polls: config.max_polls,
        }
    }
}

/// Where the orchestrator stands between turns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Ready for the next input
    Idle,
    /// A run is being driven
    Running,
    /// The last turn failed; the next turn starts over unless a run was
    /// abandoned at the poll limit
    Terminal,
}

/// What the loop does after observing a run status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStep {
    Wait,
    SubmitToolOutputs,
    Finish,
    Fail,
}

/// Map a run status onto the next loop step
pub fn next_step(status: RunStatus) -> RunStep {
    match status {
        RunStatus::Completed => RunStep::Finish,
        RunStatus::RequiresAction => RunStep::SubmitToolOutputs,
        s if s.is_terminal_failure() => RunStep::Fail,
        _ => RunStep::Wait,
    }
}

/// Poll a run until it completes, answering tool calls along the way.
///
/// Returns the completed run, [`LabError::RunTerminal`] when the run ends in
/// a failure status, or [`LabError::PollLimit`] when the policy's budget runs
/// out first.
pub async fn drive_run(
    runtime: &dyn AgentRuntime,
    thread_id: &str,
    run: Run,
    handler: &dyn ToolCallHandler,
    policy: &RunPolicy,
) -> Result<Run> {
    let run_id = run.id;
    let mut polls = 0usize;

    loop {
        if let Some(max_polls) = policy.max_polls {
            if polls >= max_polls {
                warn!(run_id = %run_id, polls, "Run did not finish within the poll budget");
                return Err(LabError::PollLimit { run_id, polls });
            }
        }

        let current = runtime.get_run(thread_id, &run_id).await?;
        polls += 1;

        match next_step(current.status) {
            RunStep::Wait => {
                debug!(run_id = %run_id, status = %current.status, "Run pending");
            }
            RunStep::SubmitToolOutputs => {
                let calls = current.pending_tool_calls();
                info!(run_id = %run_id, count = calls.len(), "Run requires action");
                let outputs = handler.handle(calls).await;
                runtime
                    .submit_tool_outputs(thread_id, &run_id, &outputs)
                    .await?;
            }
            RunStep::Finish => {
                info!(run_id = %run_id, polls, "Run completed");
                return Ok(current);
            }
            RunStep::Fail => {
                let message = current.error_message();
                warn!(
                    run_id = %run_id,
                    status = %current.status,
                    error = message.as_deref().unwrap_or("no error details"),
                    "Run ended without completing"
                );
                return Err(LabError::RunTerminal {
                    run_id,
                    status: current.status,
                    message,
                });
            }
        }

        tokio::time::sleep(policy.poll_interval).await;
    }
}

/// Start a run of `agent_id` on `thread_id` and wait for it to finish
pub async fn create_and_process(
    runtime: &dyn AgentRuntime,
    thread_id: &str,
    agent_id: &str,
    handler: &dyn ToolCallHandler,
    policy: &RunPolicy,
) -> Result<Run> {
    let run = runtime.create_run(thread_id, agent_id).await?;
    debug!(run_id = %run.id, agent_id, "Run created");
    drive_run(runtime, thread_id, run, handler, policy).await
}

/// Text of the newest assistant message in a newest-first listing
pub fn latest_assistant_text(messages: &[ThreadMessage]) -> Option<String> {
    messages
        .iter()
        .filter(|m| m.role == MessageRole::Assistant)
        .find_map(|m| m.last_text().map(str::to_string))
}

/// One agent and one thread driven turn by turn
pub struct Orchestrator {
    runtime: Arc<dyn AgentRuntime>,
    handler: Arc<dyn ToolCallHandler>,
    policy: RunPolicy,
    agent_id: String,
    thread_id: String,
    phase: LoopPhase,
    stalled_run: Option<String>,
}

impl Orchestrator {
    /// Create the agent definition and its thread
    pub async fn start(
        runtime: Arc<dyn AgentRuntime>,
        definition: &AgentDefinition,
        handler: Arc<dyn ToolCallHandler>,
        policy: RunPolicy,
    ) -> Result<Self> {
        let agent = runtime.create_agent(definition).await?;
        info!(agent_id = %agent.id, name = %definition.name, "Created agent");

        let thread = match runtime.create_thread().await {
            Ok(thread) => thread,
            Err(e) => {
                if let Err(cleanup) = runtime.delete_agent(&agent.id).await {
                    warn!(agent_id = %agent.id, error = %cleanup, "Failed to delete agent after thread creation error");
                }
                return Err(e);
            }
        };
        info!(thread_id = %thread.id, "Created thread");

        Ok(Self {
            runtime,
            handler,
            policy,
            agent_id: agent.id,
            thread_id: thread.id,
            phase: LoopPhase::Idle,
            stalled_run: None,
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Post `input` and drive a run to completion.
    ///
    /// Returns the newest assistant text, or `None` when the run completed
    /// without one. After a [`LabError::PollLimit`] the abandoned run still
    /// occupies the thread, so every later turn fails with
    /// [`LabError::ThreadBusy`] without touching the runtime.
    pub async fn turn(&mut self, input: &str) -> Result<Option<String>> {
        if let Some(run_id) = &self.stalled_run {
            return Err(LabError::ThreadBusy {
                thread_id: self.thread_id.clone(),
                run_id: run_id.clone(),
            });
        }

        self.phase = LoopPhase::Running;
        let result = self.run_turn(input).await;
        if let Err(LabError::PollLimit { run_id, .. }) = &result {
            self.stalled_run = Some(run_id.clone());
        }
        self.phase = match &result {
            Ok(_) => LoopPhase::Idle,
            Err(_) => LoopPhase::Terminal,
        };
        result
    }

    async fn run_turn(&self, input: &str) -> Result<Option<String>> {
        let runtime = self.runtime.as_ref();
        runtime
            .create_message(&self.thread_id, MessageRole::User, input)
            .await?;

        create_and_process(
            runtime,
            &self.thread_id,
            &self.agent_id,
            self.handler.as_ref(),
            &self.policy,
        )
        .await?;

        let messages = runtime
            .list_messages(&self.thread_id, ListOrder::Desc)
            .await?;
        Ok(latest_assistant_text(&messages))
    }

    /// Delete the agent definition. Failures are logged, never raised.
    pub async fn shutdown(self) {
        match self.runtime.delete_agent(&self.agent_id).await {
            Ok(()) => info!(agent_id = %self.agent_id, "Deleted agent"),
            Err(e) => warn!(agent_id = %self.agent_id, error = %e, "Failed to delete agent"),
        }
    }
}
