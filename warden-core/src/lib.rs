//! # Warden
//!
//! Policy enforcement, human approval and audit logging for tool calls.
//!
//! Warden sits between something that wants to call tools (an assistant, a
//! script, a chat front end) and something that runs them (an MCP server).
//! Every call is checked against a stored policy and then either rejected,
//! run, or held until a human approves it. Every decision is written to an
//! append-only audit log.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_core::{
//!     MemoryAuditLog, MemoryPolicyStore, Outcome, PermissionEvaluator, ReplyOutcome, SessionId,
//!     ToolError, ToolExecutor, ToolMediator, ToolResult,
//! };
//!
//! struct Files;
//!
//! #[async_trait::async_trait]
//! impl ToolExecutor for Files {
//!     async fn execute(&self, tool: &str, _args: serde_json::Value) -> Result<ToolResult, ToolError> {
//!         Ok(ToolResult::text(format!("{} done", tool)))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mediator = ToolMediator::new(
//!     PermissionEvaluator::new(MemoryPolicyStore::new()),
//!     Arc::new(MemoryAuditLog::new()),
//!     Arc::new(Files),
//! );
//! let session = SessionId::new();
//!
//! // write_file needs approval out of the box
//! let outcome = mediator
//!     .request(session, "write_file", serde_json::json!({"filepath": "a.txt"}), false)
//!     .await?;
//! assert!(matches!(outcome, Outcome::PendingApproval { .. }));
//!
//! // The human says yes
//! let reply = mediator.reply(session, "yes").await?;
//! assert!(matches!(reply, ReplyOutcome::Approved(Outcome::Executed { approved: true, .. })));
//! # Ok::<(), warden_core::Error>(())
//! # }).unwrap();
//! ```
//!
//! ## Verdicts
//!
//! | Verdict | What happens | Audit record |
//! |---------|--------------|--------------|
//! | `allow` | Runs immediately | `ALLOWED` |
//! | `deny`  | Rejected, never runs | `DENIED` |
//! | `ask`   | Held until a human replies | `ASK`, then `ALLOWED` or `CANCELLED` |
//!
//! Verdicts are stored per tool (`write_file`) or per exact argument
//! combination (`write_file:{"filepath": "a.txt"}`); see [`policy`].
//!
//! ## MCP Support
//!
//! With the `mcp` feature, [`mcp::McpClient`] connects to an MCP server over
//! stdio or streamable HTTP and serves as both executor and catalog.

pub mod approval;
pub mod audit;
pub mod config;
pub mod error;
pub mod mediator;
pub mod policy;
pub mod risk;
pub mod tool;

#[cfg(feature = "mcp")]
pub mod mcp;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use approval::{ApprovalCoordinator, ApprovalState, PendingApproval, Reply, SessionId};
pub use audit::{AuditError, AuditLog, AuditRecord, Decision, FileAuditLog, MemoryAuditLog};
pub use config::{ConfigError, WardenConfig};
pub use error::{Error, Result};
pub use mediator::{AnnotatedTool, MediatorError, Outcome, ReplyOutcome, ToolMediator};
pub use policy::{
    canonicalize, FilePolicyStore, MemoryPolicyStore, PermissionEvaluator, PolicyKey, PolicyStore,
    PolicyStoreError, Verdict,
};
pub use risk::{RiskAssessment, RiskCatalog, RiskTier};
pub use tool::{
    PromptDescriptor, ResourceDescriptor, ToolCatalog, ToolDescriptor, ToolError, ToolExecutor,
    ToolResult,
};
