//! Integration tests for the MCP client against the mock file server

#![cfg(feature = "mcp")]

mod common;

use common::mock_file_server;
use serde_json::json;
use std::sync::Arc;
use warden_core::mcp::{McpClient, McpServerConfig, McpTransport};
use warden_core::{
    MemoryAuditLog, MemoryPolicyStore, Outcome, PermissionEvaluator, ReplyOutcome, SessionId,
    ToolCatalog, ToolError, ToolExecutor, ToolMediator, ToolResult,
};

#[tokio::test]
async fn test_connect_and_disconnect() {
    let client = mock_file_server::client("files");

    client.connect().await.expect("connect");
    assert!(client.is_connected().await);
    client.connect().await.expect("second connect is a no-op");

    client.disconnect().await.unwrap();
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn test_list_tools() {
    let client = mock_file_server::client("files");

    let tools = client.list_tools().await.expect("list tools");
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["read_file", "write_file", "delete_file", "execute_command"]
    );
    assert!(tools[1].input_schema["properties"]["content"].is_object());
}

#[tokio::test]
async fn test_only_tools_filters_catalog() {
    let client = McpClient::new(
        McpServerConfig::new(
            "files",
            McpTransport::stdio(mock_file_server::command()).build(),
        )
        .only_tools(["read_file"]),
    );

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "read_file");
}

#[tokio::test]
async fn test_execute_text_result() {
    let client = mock_file_server::client("files");

    let written = client
        .execute("write_file", json!({"filepath": "a.txt", "content": "hello"}))
        .await
        .unwrap();
    assert_eq!(written, ToolResult::Text("Successfully wrote to a.txt".into()));

    let read = client
        .execute("read_file", json!({"filepath": "a.txt"}))
        .await
        .unwrap();
    assert_eq!(read.as_str(), Some("hello"));
}

#[tokio::test]
async fn test_execute_error_flag() {
    let client = mock_file_server::client("files");

    let err = client
        .execute("read_file", json!({"filepath": "missing.txt"}))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ToolError::Failed(ref msg) if msg == "File missing.txt not found"),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_resources() {
    let client = mock_file_server::client("files");

    let resources = client.list_resources().await.unwrap();
    let uris: Vec<&str> = resources.iter().map(|r| r.uri.as_str()).collect();
    assert_eq!(uris, vec!["file://config/permissions", "file://audit/log"]);

    let text = client.read_resource("file://config/permissions").await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["delete_file"], "deny");

    assert!(client.read_resource("file://nope").await.is_err());
}

#[tokio::test]
async fn test_prompts() {
    let client = mock_file_server::client("files");

    let prompts = client.list_prompts().await.unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].name, "security_review");
    assert_eq!(prompts[0].arguments, vec!["operation", "risk_level"]);

    let text = client
        .get_prompt(
            "security_review",
            json!({"operation": "delete_file", "risk_level": "HIGH"}),
        )
        .await
        .unwrap();
    assert!(text.contains("Operation: delete_file"));
    assert!(text.contains("Risk Level: HIGH"));
}

#[tokio::test]
async fn test_mediator_over_mcp() {
    let client = Arc::new(mock_file_server::client("files"));
    let audit = Arc::new(MemoryAuditLog::new());
    let mediator = ToolMediator::new(
        PermissionEvaluator::new(MemoryPolicyStore::new()),
        audit.clone(),
        client.clone(),
    )
    .with_catalog(client.clone());
    let session = SessionId::new();

    let pending = mediator
        .request(session, "write_file", json!({"filepath": "n.txt", "content": "note"}), false)
        .await
        .unwrap();
    assert!(pending.is_pending());

    let reply = mediator.reply(session, "yes").await.unwrap();
    let ReplyOutcome::Approved(outcome) = reply else {
        panic!("expected approval, got {:?}", reply);
    };
    assert_eq!(
        outcome.message(),
        "Operation approved and executed.\n\nSuccessfully wrote to n.txt"
    );

    let read = mediator
        .request(session, "read_file", json!({"filepath": "n.txt"}), false)
        .await
        .unwrap();
    assert!(matches!(read, Outcome::Executed { approved: false, .. }));
    assert_eq!(read.message(), "note");

    let denied = mediator
        .request(session, "delete_file", json!({"filepath": "n.txt"}), false)
        .await
        .unwrap();
    assert!(matches!(denied, Outcome::Denied { .. }));

    let tools = mediator.annotated_tools().await.unwrap();
    assert_eq!(
        tools[2].tool.description,
        "Delete a file (Permission: deny, Risk: high)"
    );
    assert_eq!(audit.records().len(), 4);

    client.disconnect().await.unwrap();
}
