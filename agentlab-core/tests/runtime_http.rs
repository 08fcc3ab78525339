//! REST runtime client against a mock runtime

use agentlab_core::error::LabError;
use agentlab_core::orchestrator::{Orchestrator, RunPolicy, ToolCallHandler};
use agentlab_core::runtime::{
    AgentDefinition, AgentRuntime, HttpAgentRuntime, ListOrder, MessageRole, ToolCall,
    ToolDefinition, ToolOutput,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn runtime(server: &MockServer) -> HttpAgentRuntime {
    HttpAgentRuntime::new(format!("{}/", server.uri()), "v1").with_api_key("test-key")
}

fn run_body(status: &str) -> Value {
    json!({
        "id": "run_1",
        "object": "thread.run",
        "thread_id": "thread_1",
        "assistant_id": "asst_1",
        "status": status
    })
}

#[tokio::test]
async fn test_create_agent_sends_version_and_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/assistants"))
        .and(query_param("api-version", "v1"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "name": "single-agent-demo",
            "tools": [{"type": "code_interpreter"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "asst_abc",
            "object": "assistant",
            "name": "single-agent-demo",
            "model": "gpt-4o"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let definition = AgentDefinition::new("gpt-4o", "single-agent-demo", "Help with math")
        .with_tool(ToolDefinition::CodeInterpreter);
    let agent = runtime(&server).create_agent(&definition).await.unwrap();

    assert_eq!(agent.id, "asst_abc");
    assert_eq!(agent.name.as_deref(), Some("single-agent-demo"));
}

#[tokio::test]
async fn test_error_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "invalid_request", "message": "Thread quota exceeded"}
        })))
        .mount(&server)
        .await;

    let err = runtime(&server).create_thread().await.unwrap_err();
    match err {
        LabError::Runtime(message) => {
            assert!(message.contains("invalid_request"));
            assert!(message.contains("Thread quota exceeded"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_list_messages_passes_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/messages"))
        .and(query_param("order", "desc"))
        .and(query_param("api-version", "v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {
                    "id": "msg_2",
                    "role": "assistant",
                    "created_at": 1735689600,
                    "content": [
                        {"type": "image_file", "image_file": {"file_id": "file_1"}},
                        {"type": "text", "text": {"value": "Here is the chart.", "annotations": []}}
                    ]
                },
                {
                    "id": "msg_1",
                    "role": "user",
                    "content": [{"type": "text", "text": {"value": "Plot y = 4x + 9"}}]
                }
            ]
        })))
        .mount(&server)
        .await;

    let messages = runtime(&server)
        .list_messages("thread_1", ListOrder::Desc)
        .await
        .unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::Assistant);
    assert_eq!(messages[0].last_text(), Some("Here is the chart."));
    assert!(messages[0].created_at.is_some());
    assert_eq!(messages[1].text(), "Plot y = 4x + 9");
}

#[tokio::test]
async fn test_delete_agent() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/assistants/asst_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "asst_abc",
            "object": "assistant.deleted",
            "deleted": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    runtime(&server).delete_agent("asst_abc").await.unwrap();
}

/// Answers every call with a fixed text
struct FixedHandler(&'static str);

#[async_trait]
impl ToolCallHandler for FixedHandler {
    async fn handle(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        calls
            .iter()
            .map(|c| ToolOutput::new(c.id.clone(), self.0))
            .collect()
    }
}

#[tokio::test]
async fn test_orchestrator_turn_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/assistants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "asst_1"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "thread_1"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/messages"))
        .and(body_partial_json(json!({"role": "user", "content": "What is the weather?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "role": "user",
            "content": [{"type": "text", "text": {"value": "What is the weather?"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .and(body_partial_json(json!({"assistant_id": "asst_1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "assistant_id": "asst_1",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_outputs",
                "submit_tool_outputs": {
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_forecast", "arguments": "{\"city\":\"SF\"}"}
                    }]
                }
            }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("completed")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs/run_1/submit_tool_outputs"))
        .and(body_partial_json(json!({
            "tool_outputs": [{"tool_call_id": "call_1", "output": "Foggy, 61F"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/messages"))
        .and(query_param("order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "msg_2",
                "role": "assistant",
                "content": [{"type": "text", "text": {"value": "It is foggy and 61F."}}]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/assistants/asst_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
        .expect(1)
        .mount(&server)
        .await;

    let definition = AgentDefinition::new("gpt-4o", "mcp-bridge", "Use the tools");
    let policy = RunPolicy::default().with_poll_interval(Duration::ZERO);
    let mut orchestrator = Orchestrator::start(
        Arc::new(runtime(&server)),
        &definition,
        Arc::new(FixedHandler("Foggy, 61F")),
        policy,
    )
    .await
    .unwrap();

    let reply = orchestrator.turn("What is the weather?").await.unwrap();
    assert_eq!(reply.as_deref(), Some("It is foggy and 61F."));
    orchestrator.shutdown().await;
}
