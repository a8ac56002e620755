//! Append-only audit trail of policy decisions.
//!
//! Every decision the mediator makes is written as one line:
//!
//! ```text
//! [2025-01-14T09:30:12.482113+01:00] TOOL: write_file - Decision: ASK - Reason: Awaiting approval
//! ```
//!
//! Lines are never rewritten or reordered. The log is the only record of
//! what was decided when; the policy store only knows the current policy.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, SecondsFormat};
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Errors that can occur while writing or reading the audit log.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Failed to append to audit log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read audit log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// The call was authorized and handed to the executor.
    Allowed,
    /// Policy rejected the call.
    Denied,
    /// The call is waiting for a human.
    Ask,
    /// A human rejected a pending call.
    Cancelled,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allowed => "ALLOWED",
            Decision::Denied => "DENIED",
            Decision::Ask => "ASK",
            Decision::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ALLOWED" => Some(Decision::Allowed),
            "DENIED" => Some(Decision::Denied),
            "ASK" => Some(Decision::Ask),
            "CANCELLED" => Some(Decision::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const DECISION_SEP: &str = " - Decision: ";
const REASON_SEP: &str = " - Reason: ";

/// One decision event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub operation: String,
    pub decision: Decision,
    /// Empty when no reason was given.
    pub reason: String,
}

impl AuditRecord {
    /// Create a record stamped with the current local time.
    pub fn new(operation: impl Into<String>, decision: Decision, reason: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().fixed_offset(),
            operation: operation.into(),
            decision,
            reason: reason.into(),
        }
    }

    /// Operation descriptor used for tool calls.
    pub fn tool_descriptor(tool_name: &str) -> String {
        format!("TOOL: {}", tool_name)
    }

    /// Render the record as a single log line (without the newline).
    ///
    /// Embedded line breaks are flattened to spaces so one record always
    /// occupies exactly one line.
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "[{}] {}{}{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false),
            single_line(&self.operation),
            DECISION_SEP,
            self.decision
        );
        if !self.reason.is_empty() {
            line.push_str(REASON_SEP);
            line.push_str(&single_line(&self.reason));
        }
        line
    }

    /// Recover a record from a log line.
    ///
    /// Accepts both offset-carrying timestamps and naive ones (taken as
    /// local time). Returns `None` for lines that are not audit records.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('[')?;
        let (ts, rest) = rest.split_once("] ")?;
        let timestamp = parse_timestamp(ts)?;

        let (operation, rest) = rest.split_once(DECISION_SEP)?;
        let (decision, reason) = match rest.split_once(REASON_SEP) {
            Some((decision, reason)) => (decision, reason),
            None => (rest, ""),
        };

        Some(Self {
            timestamp,
            operation: operation.to_string(),
            decision: Decision::parse(decision.trim_end())?,
            reason: reason.trim_end().to_string(),
        })
    }
}

impl std::fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_line())
    }
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

fn parse_timestamp(ts: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()?
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

/// Trait for audit log implementations.
///
/// Implementations must serialize appends so concurrent writers never
/// interleave partial lines.
pub trait AuditLog: Send + Sync {
    /// Append one record. Must complete (or fail) before returning.
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;

    /// Every line written so far, oldest first.
    fn read_all(&self) -> Result<Vec<String>, AuditError>;

    /// Build a record for `operation` and append it.
    fn record(
        &self,
        operation: &str,
        decision: Decision,
        reason: &str,
    ) -> Result<AuditRecord, AuditError> {
        let record = AuditRecord::new(operation, decision, reason);
        self.append(&record)?;
        Ok(record)
    }
}

/// Audit log backed by an append-only text file.
///
/// The file and its parent directories are created on the first append.
pub struct FileAuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for FileAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let write_err = |source| AuditError::Write {
            path: self.path.clone(),
            source,
        };

        let mut line = record.to_line();
        line.push('\n');

        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        file.write_all(line.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<String>, AuditError> {
        let _guard = self.lock.lock();
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(AuditError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// In-memory audit log, useful for tests and embedding.
#[derive(Default)]
pub struct MemoryAuditLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed view of every record, oldest first.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.lines
            .lock()
            .iter()
            .filter_map(|line| AuditRecord::parse(line))
            .collect()
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.lines.lock().push(record.to_line());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<String>, AuditError> {
        Ok(self.lines.lock().clone())
    }
}
