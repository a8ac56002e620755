//! Common test utilities shared across test files.
//!
//! Items here may not be used by all test files, hence the module-level allow.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use warden_core::{
    AuditError, AuditLog, AuditRecord, FileAuditLog, FilePolicyStore, MemoryAuditLog,
    PermissionEvaluator, ToolError, ToolExecutor, ToolMediator, ToolResult, WardenConfig,
};

#[cfg(feature = "mcp")]
pub mod mock_file_server;

// ===== Recording executor =====

/// Executor that echoes the call back and remembers every invocation.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    failing: Arc<Mutex<Option<String>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `tool` fail.
    pub fn failing(tool: &str) -> Self {
        let executor = Self::default();
        *executor.failing.lock() = Some(tool.to_string());
        executor
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ToolExecutor for RecordingExecutor {
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<ToolResult, ToolError> {
        self.calls
            .lock()
            .push((tool_name.to_string(), arguments.clone()));
        if self.failing.lock().as_deref() == Some(tool_name) {
            return Err(ToolError::Failed(format!("{} exploded", tool_name)));
        }
        Ok(ToolResult::Text(format!("{} {}", tool_name, arguments)))
    }
}

// ===== Audit sinks =====

/// Audit log that rejects every append.
pub struct BrokenAuditLog;

impl AuditLog for BrokenAuditLog {
    fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Err(AuditError::Write {
            path: "/dev/full".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        })
    }

    fn read_all(&self) -> Result<Vec<String>, AuditError> {
        Ok(Vec::new())
    }
}

/// In-memory audit log whose appends can be made to fail mid-test.
#[derive(Default)]
pub struct SwitchableAuditLog {
    inner: MemoryAuditLog,
    broken: AtomicBool,
}

impl SwitchableAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.inner.records()
    }
}

impl AuditLog for SwitchableAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        if self.broken.load(Ordering::SeqCst) {
            return BrokenAuditLog.append(record);
        }
        self.inner.append(record)
    }

    fn read_all(&self) -> Result<Vec<String>, AuditError> {
        self.inner.read_all()
    }
}

// ===== Mediator construction =====

/// A mediator persisting to `dir`, as the CLI would build it.
pub fn file_mediator(dir: &Path, executor: &RecordingExecutor) -> ToolMediator {
    ToolMediator::from_config(&WardenConfig::from_data_dir(dir), Arc::new(executor.clone()))
        .expect("data dir should be usable")
}

/// A mediator over explicit file stores.
pub fn mediator_with_audit(
    dir: &Path,
    audit: Arc<dyn AuditLog>,
    executor: &RecordingExecutor,
) -> ToolMediator {
    let store = FilePolicyStore::open(dir.join("permissions.json")).expect("open store");
    ToolMediator::new(PermissionEvaluator::new(store), audit, Arc::new(executor.clone()))
}

/// Parsed records from the audit file in `dir`.
pub fn audit_records(dir: &Path) -> Vec<AuditRecord> {
    FileAuditLog::new(dir.join("audit.log"))
        .read_all()
        .expect("read audit log")
        .iter()
        .filter_map(|line| AuditRecord::parse(line))
        .collect()
}
