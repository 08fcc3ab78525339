//! REST client for the hosted agent runtime

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::AgentRuntime;
use super::types::{
    Agent, AgentDefinition, ListOrder, ListResponse, MessageRole, Run, Thread, ThreadMessage,
    ToolOutput,
};
use crate::config::RuntimeConfig;
use crate::error::{LabError, Result};

/// Hosted agent runtime reached over HTTP.
///
/// Every request carries the `api-version` query parameter and, when a
/// credential is configured, a bearer `Authorization` header.
pub struct HttpAgentRuntime {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    api_key: Option<String>,
}

impl HttpAgentRuntime {
    /// Create a client for a project endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Project endpoint, e.g. `https://<resource>.services.ai.azure.com/api/projects/<project>`
    /// * `api_version` - Value of the `api-version` query parameter
    pub fn new(endpoint: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
            api_key: None,
        }
    }

    /// Attach a bearer credential.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Create a client from the runtime section of the configuration.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let runtime = Self::new(&config.endpoint, &config.api_version);
        match &config.api_key {
            Some(key) => runtime.with_api_key(key),
            None => runtime,
        }
    }

    /// Get the endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.endpoint, path);
        let builder = self
            .client
            .request(method, url)
            .query(&[("api-version", self.api_version.as_str())]);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T> {
        let response = builder.send().await.map_err(|e| {
            LabError::Runtime(format!("Failed to send {} request: {}", what, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(error) = serde_json::from_str::<RuntimeErrorBody>(&text) {
                return Err(LabError::Runtime(format!(
                    "{} failed ({}): {}",
                    what,
                    error.error.code.unwrap_or_else(|| status.to_string()),
                    error.error.message
                )));
            }

            return Err(LabError::Runtime(format!(
                "{} failed ({}): {}",
                what, status, text
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LabError::Runtime(format!("Failed to parse {} response: {}", what, e)))
    }
}

#[derive(Deserialize)]
struct RuntimeErrorBody {
    error: RuntimeErrorDetail,
}

#[derive(Deserialize)]
struct RuntimeErrorDetail {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

#[derive(Deserialize)]
struct DeletionStatus {
    #[serde(default)]
    deleted: bool,
}

#[async_trait]
impl AgentRuntime for HttpAgentRuntime {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<Agent> {
        let builder = self.request(Method::POST, "assistants").json(definition);
        self.send(builder, "create agent").await
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("assistants/{}", agent_id));
        let status: DeletionStatus = self.send(builder, "delete agent").await?;
        if !status.deleted {
            return Err(LabError::Runtime(format!(
                "Agent {} was not deleted",
                agent_id
            )));
        }
        Ok(())
    }

    async fn create_thread(&self) -> Result<Thread> {
        let builder = self.request(Method::POST, "threads").json(&json!({}));
        self.send(builder, "create thread").await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        let builder = self
            .request(Method::POST, &format!("threads/{}/messages", thread_id))
            .json(&json!({ "role": role, "content": content }));
        self.send(builder, "create message").await
    }

    async fn list_messages(&self, thread_id: &str, order: ListOrder) -> Result<Vec<ThreadMessage>> {
        let builder = self
            .request(Method::GET, &format!("threads/{}/messages", thread_id))
            .query(&[("order", order.as_str())]);
        let list: ListResponse<ThreadMessage> = self.send(builder, "list messages").await?;
        Ok(list.data)
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run> {
        let builder = self
            .request(Method::POST, &format!("threads/{}/runs", thread_id))
            .json(&json!({ "assistant_id": agent_id }));
        self.send(builder, "create run").await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let builder = self.request(
            Method::GET,
            &format!("threads/{}/runs/{}", thread_id, run_id),
        );
        self.send(builder, "get run").await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        let builder = self
            .request(
                Method::POST,
                &format!("threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
            )
            .json(&json!({ "tool_outputs": outputs }));
        self.send(builder, "submit tool outputs").await
    }
}
