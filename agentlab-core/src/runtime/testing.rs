//! Scripted runtime for unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::AgentRuntime;
use super::types::{
    Agent, AgentDefinition, ListOrder, MessageContent, MessageRole, RequiredAction, Run,
    RunError, RunStatus, SubmitToolOutputs, TextContent, Thread, ThreadMessage, ToolCall,
    ToolOutput,
};
use crate::error::{LabError, Result};

/// Runtime that replays a fixed sequence of run statuses.
///
/// Once the script is exhausted every poll reports `in_progress`.
#[derive(Default)]
pub(crate) struct ScriptedRuntime {
    statuses: Mutex<VecDeque<RunStatus>>,
    tool_calls: Vec<ToolCall>,
    reply: Option<String>,
    fail_delete: bool,
    agents: Mutex<Vec<AgentDefinition>>,
    deleted: Mutex<Vec<String>>,
    messages: Mutex<Vec<(MessageRole, String)>>,
    runs: Mutex<Vec<String>>,
    submitted: Mutex<Vec<Vec<ToolOutput>>>,
    polls: AtomicUsize,
    message_fetches: AtomicUsize,
}

impl ScriptedRuntime {
    pub(crate) fn new(statuses: &[RunStatus]) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            ..Default::default()
        }
    }

    pub(crate) fn with_tool_calls(mut self, calls: Vec<ToolCall>) -> Self {
        self.tool_calls = calls;
        self
    }

    pub(crate) fn with_reply(mut self, reply: &str) -> Self {
        self.reply = Some(reply.to_string());
        self
    }

    pub(crate) fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub(crate) fn created_agents(&self) -> Vec<AgentDefinition> {
        self.agents.lock().unwrap().clone()
    }

    pub(crate) fn deleted_agents(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub(crate) fn posted_messages(&self) -> Vec<(MessageRole, String)> {
        self.messages.lock().unwrap().clone()
    }

    /// Agent id of every run created, in order
    pub(crate) fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }

    pub(crate) fn submitted_batches(&self) -> Vec<Vec<ToolOutput>> {
        self.submitted.lock().unwrap().clone()
    }

    pub(crate) fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub(crate) fn message_fetches(&self) -> usize {
        self.message_fetches.load(Ordering::SeqCst)
    }

    fn run(&self, id: &str, status: RunStatus) -> Run {
        let required_action = (status == RunStatus::RequiresAction).then(|| RequiredAction {
            kind: "submit_tool_outputs".to_string(),
            submit_tool_outputs: Some(SubmitToolOutputs {
                tool_calls: self.tool_calls.clone(),
            }),
        });
        let last_error = (status == RunStatus::Failed).then(|| RunError {
            code: Some("server_error".to_string()),
            message: "model overloaded".to_string(),
        });
        Run {
            id: id.to_string(),
            thread_id: "thread_1".to_string(),
            assistant_id: "asst_1".to_string(),
            status,
            required_action,
            last_error,
        }
    }
}

fn text_message(id: &str, role: MessageRole, text: &str) -> ThreadMessage {
    ThreadMessage {
        id: id.to_string(),
        role,
        content: vec![MessageContent::Text {
            text: TextContent {
                value: text.to_string(),
            },
        }],
        created_at: None,
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<Agent> {
        let mut agents = self.agents.lock().unwrap();
        agents.push(definition.clone());
        Ok(Agent {
            id: format!("asst_{}", agents.len()),
            name: Some(definition.name.clone()),
            model: Some(definition.model.clone()),
        })
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        if self.fail_delete {
            return Err(LabError::Runtime("delete agent failed (503)".to_string()));
        }
        self.deleted.lock().unwrap().push(agent_id.to_string());
        Ok(())
    }

    async fn create_thread(&self) -> Result<Thread> {
        Ok(Thread {
            id: "thread_1".to_string(),
        })
    }

    async fn create_message(
        &self,
        _thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        let mut messages = self.messages.lock().unwrap();
        messages.push((role, content.to_string()));
        Ok(text_message(&format!("msg_{}", messages.len()), role, content))
    }

    async fn list_messages(&self, _thread_id: &str, order: ListOrder) -> Result<Vec<ThreadMessage>> {
        self.message_fetches.fetch_add(1, Ordering::SeqCst);
        let mut list: Vec<ThreadMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, (role, text))| text_message(&format!("msg_{}", i + 1), *role, text))
            .collect();
        if let Some(reply) = &self.reply {
            list.push(text_message("msg_reply", MessageRole::Assistant, reply));
        }
        if order == ListOrder::Desc {
            list.reverse();
        }
        Ok(list)
    }

    async fn create_run(&self, _thread_id: &str, agent_id: &str) -> Result<Run> {
        let mut runs = self.runs.lock().unwrap();
        runs.push(agent_id.to_string());
        Ok(self.run(&format!("run_{}", runs.len()), RunStatus::Queued))
    }

    async fn get_run(&self, _thread_id: &str, run_id: &str) -> Result<Run> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RunStatus::InProgress);
        Ok(self.run(run_id, status))
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        self.submitted.lock().unwrap().push(outputs.to_vec());
        Ok(self.run(run_id, RunStatus::Queued))
    }
}
