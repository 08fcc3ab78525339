//! HTTP transport to remote agents

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

use super::card::{AGENT_CARD_PATH, AgentCard, AgentDescriptor};
use crate::error::{LabError, Result};
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};

/// How the registry and the router reach remote agents
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Fetch the agent card published under `base_url`
    async fn fetch_card(&self, base_url: &str) -> Result<AgentCard>;

    /// Send a text payload to a resolved agent and return its textual reply
    async fn send_message(&self, descriptor: &AgentDescriptor, payload: &str) -> Result<String>;
}

/// reqwest-backed transport speaking A2A JSON-RPC `message/send`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Probe `GET <base_url>/health`; used for troubleshooting only.
    pub async fn check_health(&self, base_url: &str) -> Result<bool> {
        let url = format!("{}/health", base_url.trim_end_matches('/'));
        let response = self.client.get(url).send().await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn fetch_card(&self, base_url: &str) -> Result<AgentCard> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), AGENT_CARD_PATH);
        let discovery = |reason: String| LabError::Discovery {
            url: base_url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| discovery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(discovery(format!("HTTP {}", response.status())));
        }

        response
            .json::<AgentCard>()
            .await
            .map_err(|e| discovery(format!("malformed agent card: {}", e)))
    }

    async fn send_message(&self, descriptor: &AgentDescriptor, payload: &str) -> Result<String> {
        let message_id = uuid::Uuid::new_v4().to_string();
        let request = JsonRpcRequest::new(message_id.as_str(), "message/send").with_params(json!({
            "message": {
                "role": "user",
                "parts": [{ "kind": "text", "text": payload }],
                "messageId": message_id,
            }
        }));
        let invocation = |reason: String| LabError::RemoteInvocation {
            agent: descriptor.name.clone(),
            reason,
        };

        let response = self
            .client
            .post(&descriptor.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| invocation(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| invocation(e.to_string()))?;

        if !status.is_success() {
            return Err(invocation(format!("HTTP {}: {}", status, body)));
        }

        match serde_json::from_str::<JsonRpcResponse>(&body) {
            Ok(reply) => {
                let result = reply.into_result().map_err(|e| invocation(e.to_string()))?;
                Ok(extract_reply_text(&result).unwrap_or_else(|| result.to_string()))
            }
            Err(_) => Ok(body),
        }
    }
}

/// Text of an A2A `message/send` result.
///
/// A `message` result yields its text parts; a `task` result yields its
/// artifact texts, falling back to the final status message.
pub fn extract_reply_text(result: &Value) -> Option<String> {
    let joined = |parts: Option<&Value>| -> Option<String> {
        let texts: Vec<&str> = parts?
            .as_array()?
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();
        (!texts.is_empty()).then(|| texts.join("\n"))
    };

    match result.get("kind").and_then(Value::as_str) {
        Some("message") => joined(result.get("parts")),
        Some("task") => {
            let artifacts: Vec<String> = result
                .get("artifacts")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(|art| joined(art.get("parts"))).collect())
                .unwrap_or_default();
            if !artifacts.is_empty() {
                return Some(artifacts.join("\n"));
            }
            joined(result.pointer("/status/message/parts"))
        }
        _ => None,
    }
}
