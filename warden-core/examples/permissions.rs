//! Scripted Permission Flow Example
//!
//! Runs three in-process tools through a mediator:
//!
//! 1. **read_file** - allowed by the baseline policy (runs immediately)
//! 2. **write_file** - `ask` by default (parks until a reply)
//! 3. **execute_command** - denied by the baseline policy
//!
//! Policies and audit records stay in memory; nothing touches disk.
//!
//! Run with: cargo run --example permissions

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use warden_core::{
    MemoryAuditLog, MemoryPolicyStore, Outcome, PermissionEvaluator, ReplyOutcome, SessionId,
    ToolError, ToolExecutor, ToolMediator, ToolResult, Verdict,
};

// =============================================================================
// Tools
// =============================================================================

/// Pretends to be a file server.
struct FakeFiles;

#[async_trait]
impl ToolExecutor for FakeFiles {
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<ToolResult, ToolError> {
        let path = arguments["filepath"].as_str().unwrap_or("?");
        match tool_name {
            "read_file" => Ok(ToolResult::text(format!("contents of {}", path))),
            "write_file" => Ok(ToolResult::text(format!("Successfully wrote to {}", path))),
            "execute_command" => Ok(ToolResult::text("this never runs")),
            other => Err(ToolError::Failed(format!("unknown tool {}", other))),
        }
    }
}

fn show(label: &str, outcome: &Outcome) {
    let marker = match outcome {
        Outcome::Executed { .. } => "\x1b[32m✓\x1b[0m",
        Outcome::Denied { .. } => "\x1b[31m⛔\x1b[0m",
        Outcome::PendingApproval { .. } => "\x1b[33m?\x1b[0m",
    };
    println!("{} \x1b[1m{}\x1b[0m", marker, label);
    for line in outcome.message().lines() {
        println!("    {}", line);
    }
    println!();
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> warden_core::Result<()> {
    let audit = Arc::new(MemoryAuditLog::new());
    let mediator = ToolMediator::new(
        PermissionEvaluator::new(MemoryPolicyStore::new()),
        audit.clone(),
        Arc::new(FakeFiles),
    );
    let session = SessionId::new();

    println!();
    println!("\x1b[1;36m========================================\x1b[0m");
    println!("\x1b[1;36m  Scripted Permission Flow Demo         \x1b[0m");
    println!("\x1b[1;36m========================================\x1b[0m");
    println!();
    println!("{}\n", mediator.permission_summary().await?);

    let read = mediator
        .request(session, "read_file", json!({"filepath": "notes.txt"}), false)
        .await?;
    show("read_file", &read);

    let write = mediator
        .request(
            session,
            "write_file",
            json!({"filepath": "notes.txt", "content": "hello"}),
            false,
        )
        .await?;
    show("write_file", &write);

    println!("\x1b[2m> yes\x1b[0m\n");
    if let ReplyOutcome::Approved(outcome) = mediator.reply(session, "yes").await? {
        show("write_file (approved)", &outcome);
    }

    let command = mediator
        .request(session, "execute_command", json!({"command": "rm -rf /"}), false)
        .await?;
    show("execute_command", &command);

    // Pin one exact call to allow while the tool as a whole stays denied
    mediator
        .set_argument_policy("execute_command", &json!({"command": "ls"}), Verdict::Allow)
        .await?;
    let listing = mediator
        .request(session, "execute_command", json!({"command": "ls"}), false)
        .await?;
    show("execute_command ls (pinned)", &listing);

    println!("\x1b[1mAudit trail:\x1b[0m");
    for line in mediator.audit_history()? {
        println!("  {}", line);
    }
    println!();

    Ok(())
}
