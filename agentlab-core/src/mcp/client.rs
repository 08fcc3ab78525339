//! Streamable HTTP MCP client
//!
//! Every message is a POST to the server URL. The server answers either with
//! a JSON body or with a `text/event-stream` body whose `data:` lines carry
//! the JSON-RPC response. A session id handed out on `initialize` is echoed
//! in the `Mcp-Session-Id` header of every later request.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::protocol::{
    InitializeParams, InitializeResult, McpTool, ServerInfo, ToolCallParams, ToolCallResult,
    ToolsListResult,
};
use crate::error::{LabError, Result};
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId};

/// Session header defined by the streamable HTTP transport
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

const ACCEPT: &str = "application/json, text/event-stream";
const CLIENT_NAME: &str = "agentlab";

/// Tool operations the bridge needs from an MCP session
#[async_trait]
pub trait McpToolClient: Send + Sync {
    /// List every tool the server exposes
    async fn list_tools(&self) -> Result<Vec<McpTool>>;

    /// Call a tool by name
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult>;
}

/// An initialized MCP session over streamable HTTP
#[derive(Debug)]
pub struct McpClient {
    client: reqwest::Client,
    url: String,
    session_id: Mutex<Option<String>>,
    next_id: AtomicI64,
    server_info: Option<ServerInfo>,
}

impl McpClient {
    /// Connect to `url` and complete the `initialize` handshake
    pub async fn connect(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut session = Self {
            client,
            url: url.into(),
            session_id: Mutex::new(None),
            next_id: AtomicI64::new(1),
            server_info: None,
        };

        let params = serde_json::to_value(InitializeParams::for_client(CLIENT_NAME))?;
        let init: InitializeResult = session.request("initialize", Some(params)).await?;
        info!(
            url = %session.url,
            server = %init.server_info.name,
            protocol = %init.protocol_version,
            "Connected to MCP server"
        );
        session.server_info = Some(init.server_info);

        session.notify("notifications/initialized").await?;
        Ok(session)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Server identity reported during `initialize`
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|id| id.clone())
    }

    fn post(&self, body: &impl serde::Serialize) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .json(body);
        if let Some(id) = self.session_id() {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder
    }

    fn remember_session(&self, response: &reqwest::Response) {
        let id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok());
        if let (Some(id), Ok(mut slot)) = (id, self.session_id.lock()) {
            if slot.as_deref() != Some(id) {
                debug!(session_id = id, "MCP session established");
                *slot = Some(id.to_string());
            }
        }
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut request = JsonRpcRequest::new(id, method);
        if let Some(params) = params {
            request = request.with_params(params);
        }

        let response = self.post(&request).send().await?;
        self.remember_session(&response);

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LabError::Mcp(format!("{method} failed: HTTP {status}: {body}")));
        }

        let reply = parse_response(content_type.as_deref(), &body, &RequestId::Number(id))?;
        let result = reply
            .into_result()
            .map_err(|e| LabError::Mcp(format!("{method} failed: {e}")))?;
        Ok(serde_json::from_value(result)?)
    }

    async fn notify(&self, method: &str) -> Result<()> {
        let response = self.post(&JsonRpcNotification::new(method)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LabError::Mcp(format!("{method} failed: HTTP {status}")));
        }
        Ok(())
    }
}

#[async_trait]
impl McpToolClient for McpClient {
    /// Every page of `tools/list`; stops when a cursor comes back a second time
    async fn list_tools(&self) -> Result<Vec<McpTool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen = HashSet::new();
        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page: ToolsListResult = self.request("tools/list", params).await?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => {
                    if !seen.insert(next.clone()) {
                        warn!(cursor = %next, "MCP server repeated a tools/list cursor");
                        break;
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }
        debug!(count = tools.len(), "Listed MCP tools");
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        let params = serde_json::to_value(ToolCallParams {
            name: name.to_string(),
            arguments,
        })?;
        self.request("tools/call", Some(params)).await
    }
}

/// Decode a response body as JSON or as an event stream.
///
/// In an event stream the first `data:` payload answering `id` wins; server
/// requests and notifications interleaved on the stream are skipped.
pub fn parse_response(
    content_type: Option<&str>,
    body: &str,
    id: &RequestId,
) -> Result<JsonRpcResponse> {
    let is_stream = content_type
        .map(|ct| ct.starts_with("text/event-stream"))
        .unwrap_or(false);

    if !is_stream {
        return Ok(serde_json::from_str(body)?);
    }

    let normalized = body.replace("\r\n", "\n");
    sse_data(&normalized)
        .filter_map(|data| serde_json::from_str::<JsonRpcResponse>(&data).ok())
        .find(|reply| &reply.id == id && (reply.result.is_some() || reply.error.is_some()))
        .ok_or_else(|| LabError::Mcp("event stream ended without a response".to_string()))
}

/// `data:` payloads of each event, multi-line data joined by newlines
fn sse_data(body: &str) -> impl Iterator<Item = String> + '_ {
    body.split("\n\n").filter_map(|event| {
        let lines: Vec<&str> = event
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| data.strip_prefix(' ').unwrap_or(data))
            .collect();
        (!lines.is_empty()).then(|| lines.join("\n"))
    })
}
