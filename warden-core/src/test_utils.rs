//! Test utilities for warden-core.
//!
//! Mock tool providers and audit sinks for exercising the mediator without
//! spawning a real MCP server.
//!
//! Enable with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! warden-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_core::test_utils::MockExecutor;
//! use warden_core::{MemoryAuditLog, MemoryPolicyStore, Outcome, PermissionEvaluator, SessionId, ToolMediator};
//!
//! # tokio_test::block_on(async {
//! let executor = MockExecutor::new().with_text("read_file", "hello");
//! let mediator = ToolMediator::new(
//!     PermissionEvaluator::new(MemoryPolicyStore::new()),
//!     Arc::new(MemoryAuditLog::new()),
//!     Arc::new(executor.clone()),
//! );
//!
//! let outcome = mediator
//!     .request(SessionId::new(), "read_file", serde_json::json!({"filepath": "a"}), false)
//!     .await
//!     .unwrap();
//! assert_eq!(outcome.message(), "hello");
//! assert_eq!(executor.call_count(), 1);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::audit::{AuditError, AuditLog, AuditRecord};
use crate::tool::{
    PromptDescriptor, ResourceDescriptor, ToolCatalog, ToolDescriptor, ToolError, ToolExecutor,
    ToolResult,
};

#[derive(Clone)]
enum Scripted {
    Result(ToolResult),
    Failure(String),
}

/// A tool provider that records every call and answers from a script.
///
/// Tools without a scripted answer return `executed <tool>`.
#[derive(Clone, Default)]
pub struct MockExecutor {
    scripted: Arc<Mutex<HashMap<String, Scripted>>>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    tools: Arc<Mutex<Vec<ToolDescriptor>>>,
    resources: Arc<Mutex<Vec<(ResourceDescriptor, String)>>>,
    prompts: Arc<Mutex<Vec<(PromptDescriptor, String)>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer calls to `tool` with a text result.
    pub fn with_text(self, tool: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_result(tool, ToolResult::Text(text.into()))
    }

    pub fn with_result(self, tool: impl Into<String>, result: ToolResult) -> Self {
        self.scripted
            .lock()
            .insert(tool.into(), Scripted::Result(result));
        self
    }

    /// Make calls to `tool` fail with [`ToolError::Failed`].
    pub fn with_failure(self, tool: impl Into<String>, message: impl Into<String>) -> Self {
        self.scripted
            .lock()
            .insert(tool.into(), Scripted::Failure(message.into()));
        self
    }

    /// Advertise a tool in the catalog.
    pub fn with_tool(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.tools.lock().push(ToolDescriptor {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({"type": "object"}),
        });
        self
    }

    /// Advertise a resource with fixed contents.
    pub fn with_resource(self, uri: impl Into<String>, contents: impl Into<String>) -> Self {
        let uri = uri.into();
        self.resources.lock().push((
            ResourceDescriptor {
                name: uri.clone(),
                uri,
                description: None,
            },
            contents.into(),
        ));
        self
    }

    /// Advertise a prompt that renders to fixed text.
    pub fn with_prompt(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.prompts.lock().push((
            PromptDescriptor {
                name: name.into(),
                description: None,
                arguments: Vec::new(),
            },
            text.into(),
        ));
        self
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ToolExecutor for MockExecutor {
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<ToolResult, ToolError> {
        self.calls.lock().push((tool_name.to_string(), arguments));
        let scripted = self.scripted.lock().get(tool_name).cloned();
        match scripted {
            Some(Scripted::Result(result)) => Ok(result),
            Some(Scripted::Failure(message)) => Err(ToolError::Failed(message)),
            None => Ok(ToolResult::Text(format!("executed {}", tool_name))),
        }
    }
}

#[async_trait]
impl ToolCatalog for MockExecutor {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        Ok(self.tools.lock().clone())
    }

    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>, ToolError> {
        Ok(self.resources.lock().iter().map(|(d, _)| d.clone()).collect())
    }

    async fn read_resource(&self, uri: &str) -> Result<String, ToolError> {
        self.resources
            .lock()
            .iter()
            .find(|(d, _)| d.uri == uri)
            .map(|(_, contents)| contents.clone())
            .ok_or_else(|| ToolError::Custom(format!("Resource not found: {}", uri)))
    }

    async fn list_prompts(&self) -> Result<Vec<PromptDescriptor>, ToolError> {
        Ok(self.prompts.lock().iter().map(|(d, _)| d.clone()).collect())
    }

    async fn get_prompt(&self, name: &str, _arguments: Value) -> Result<String, ToolError> {
        self.prompts
            .lock()
            .iter()
            .find(|(d, _)| d.name == name)
            .map(|(_, text)| text.clone())
            .ok_or_else(|| ToolError::Custom(format!("Prompt not found: {}", name)))
    }
}

/// An audit sink whose appends always fail.
#[derive(Default)]
pub struct FailingAuditLog;

impl AuditLog for FailingAuditLog {
    fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Err(AuditError::Write {
            path: "unwritable.log".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    fn read_all(&self) -> Result<Vec<String>, AuditError> {
        Ok(Vec::new())
    }
}
