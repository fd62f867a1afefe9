//! End-to-end workflow tests
//!
//! Drives whole conversations with a scripted LLM while tool calls go out
//! over HTTP to a wiremock gateway.

use std::sync::Arc;
use std::time::Duration;

use mcpflow::config::{GatewayConfig, WorkflowConfig};
use mcpflow::gateway::GatewayClient;
use mcpflow::llm::{CompletionResponse, MockLlmClient, ToolCall};
use mcpflow::tools::{ToolCatalog, ToolOutput, ToolRegistry};
use mcpflow::workflow::{AgentRole, ConversationOutcome, ConversationRunner, FailureKind, RunnerConfig};
use mcpflow::ToolErrorKind;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn listing() -> Value {
    json!([
        {"name": "git_status", "description": "Working tree status", "input_schema": {"type": "object"}},
        {
            "name": "read_file",
            "description": "Read a file",
            "input_schema": {
                "type": "object",
                "properties": {"path": {"type": "string"}},
                "required": ["path"]
            }
        },
        {
            "name": "write_file",
            "description": "Write a file",
            "input_schema": {
                "type": "object",
                "properties": {"path": {"type": "string"}, "content": {"type": "string"}},
                "required": ["path", "content"]
            }
        }
    ])
}

fn client_for(uri: &str) -> GatewayClient {
    GatewayClient::new(&GatewayConfig {
        base_url: uri.to_string(),
        connect_timeout_ms: 500,
        ..Default::default()
    })
    .unwrap()
}

fn runner_config() -> RunnerConfig {
    RunnerConfig {
        tool_deadline: Duration::from_secs(2),
        ..Default::default()
    }
}

/// Mount an invoke handler for one tool that echoes the invocation id
async fn mount_tool(server: &MockServer, tool: &str, status: &'static str, payload: Value, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_partial_json(json!({"tool": tool})))
        .respond_with(move |req: &Request| {
            let body: Value = req.body_json().unwrap_or(Value::Null);
            let mut answer = json!({"invocation_id": body["invocation_id"], "status": status});
            if status == "error" {
                answer["error_message"] = payload.clone();
            } else {
                answer["payload"] = payload.clone();
            }
            ResponseTemplate::new(200).set_body_json(answer)
        })
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_conversation_through_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
        .mount(&server)
        .await;
    mount_tool(&server, "git_status", "success", json!("On branch main"), 1).await;
    mount_tool(
        &server,
        "read_file",
        "error",
        json!("ENOENT: no such file or directory, open 'CHANGELOG.md'"),
        1,
    )
    .await;
    // Only the complete write reaches the gateway
    mount_tool(&server, "write_file", "success", json!({"content": [{"type": "text", "text": "wrote 14 bytes"}]}), 1).await;

    let client = client_for(&server.uri());
    let registry = Arc::new(ToolRegistry::new());
    registry.sync(&client).await.unwrap();

    let llm = Arc::new(MockLlmClient::new(vec![
        CompletionResponse::with_tool_calls(
            "Looking around.",
            vec![
                ToolCall::new("t1", "git_status", json!({})),
                ToolCall::new("t2", "read_file", json!({"path": "CHANGELOG.md", "__arg1": "stray"})),
            ],
        ),
        CompletionResponse::text("No changelog yet."),
        CompletionResponse::text("1. create CHANGELOG.md"),
        CompletionResponse::with_tool_calls("", vec![ToolCall::new("t3", "write_file", json!({"path": "CHANGELOG.md"}))]),
        CompletionResponse::with_tool_calls(
            "",
            vec![ToolCall::new(
                "t4",
                "write_file",
                json!({"path": "CHANGELOG.md", "content": "# Changelog\n"}),
            )],
        ),
        CompletionResponse::text("Created CHANGELOG.md."),
        CompletionResponse::text("Changelog added."),
    ]));
    let runner = ConversationRunner::with_config(Arc::clone(&llm), Arc::new(client), registry, runner_config());

    let report = runner.run("Add a changelog").await;

    assert_eq!(
        report.outcome,
        ConversationOutcome::Completed {
            answer: "Changelog added.".to_string()
        }
    );
    assert_eq!(llm.remaining(), 0);

    let turns = report.state.turns();
    assert_eq!(turns[1].role, AgentRole::ToolExecutor);
    assert_eq!(turns[1].exchanges[0].output, ToolOutput::Text("On branch main".to_string()));
    assert_eq!(turns[1].exchanges[1].failure_kind(), Some(ToolErrorKind::RemoteToolError));

    // The placeholder key was dropped before the call went out
    let read = turns[1].exchanges[1].invocation.as_ref().unwrap();
    assert_eq!(read.arguments.len(), 1);
    assert_eq!(read.arguments.get("path"), Some(&json!("CHANGELOG.md")));

    let rejected = &turns[5].exchanges[0];
    assert_eq!(rejected.failure_kind(), Some(ToolErrorKind::SchemaViolation));
    assert!(rejected.invocation.is_none());
    assert_eq!(turns[7].exchanges[0].output, ToolOutput::Text("wrote 14 bytes".to_string()));

    // The remote error text reached the next agent verbatim
    let requests = llm.requests();
    let followup = &requests[1].transcript;
    assert!(followup.contains("ENOENT: no such file or directory, open 'CHANGELOG.md'"));
}

#[tokio::test]
async fn test_unreachable_gateway_blocks_orchestrator() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);

    let catalog = ToolCatalog::from_value(&listing()).unwrap();
    let registry = Arc::new(ToolRegistry::from_catalog(catalog));
    let status_call = || {
        CompletionResponse::with_tool_calls("Checking status.", vec![ToolCall::new("s", "git_status", json!({}))])
    };
    let llm = Arc::new(MockLlmClient::new(vec![status_call(), status_call(), status_call()]));
    let config = RunnerConfig {
        workflow: WorkflowConfig {
            max_consecutive_tool_failures: 3,
            ..Default::default()
        },
        ..runner_config()
    };
    let runner = ConversationRunner::with_config(Arc::clone(&llm), Arc::new(client_for(&uri)), registry, config);

    let report = runner.run("What changed?").await;

    match report.outcome {
        ConversationOutcome::Failed { kind, abandoned, .. } => {
            assert_eq!(kind, FailureKind::Tool(ToolErrorKind::TransportError));
            assert!(abandoned.is_empty());
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(report.state.len(), 6);
    assert!(report.state.turns().iter().filter(|t| t.is_tool_execution()).all(|t| t.all_failed()));
}
