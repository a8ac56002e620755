//! Top-level error types for warden
//!
//! This module provides a simplified, user-facing error type that flattens
//! the per-module error enums into actionable categories.

use thiserror::Error;

use crate::audit::AuditError;
use crate::config::ConfigError;
use crate::mediator::MediatorError;
use crate::policy::PolicyStoreError;
use crate::tool::ToolError;

#[cfg(feature = "mcp")]
use crate::mcp::McpError;

/// Top-level error type for warden operations
///
/// Categorized by how callers typically need to handle them:
///
/// - [`Error::InvalidArguments`] - Fix the request and resubmit
/// - [`Error::Tool`] - The tool ran (or was reached) and failed
/// - [`Error::Policy`] - Policy file could not be read or written
/// - [`Error::Audit`] - Audit log could not be written; nothing was executed
/// - [`Error::Config`] - Fix configuration
#[derive(Debug, Error)]
pub enum Error {
    /// Tool arguments were not a JSON object
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool execution failed
    #[error("tool error: {0}")]
    Tool(String),

    /// Policy storage failed
    #[error("policy error: {0}")]
    Policy(String),

    /// Audit log append or read failed
    #[error("audit error: {0}")]
    Audit(String),

    /// Configuration error (unreadable file, bad JSON, no catalog)
    #[error("configuration error: {0}")]
    Config(String),

    /// MCP server error
    #[cfg(feature = "mcp")]
    #[error("MCP error: {0}")]
    Mcp(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn is_invalid_arguments(&self) -> bool {
        matches!(self, Self::InvalidArguments(_))
    }

    pub fn is_tool(&self) -> bool {
        matches!(self, Self::Tool(_))
    }

    pub fn is_policy(&self) -> bool {
        matches!(self, Self::Policy(_))
    }

    pub fn is_audit(&self) -> bool {
        matches!(self, Self::Audit(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if the failure happened while persisting state
    ///
    /// Persistence faults mean the request was not carried out; the policy
    /// change was not applied, or the call was not executed.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Policy(_) | Self::Audit(_))
    }
}

impl From<ToolError> for Error {
    fn from(err: ToolError) -> Self {
        Self::Tool(err.to_string())
    }
}

impl From<PolicyStoreError> for Error {
    fn from(err: PolicyStoreError) -> Self {
        Self::Policy(err.to_string())
    }
}

impl From<AuditError> for Error {
    fn from(err: AuditError) -> Self {
        Self::Audit(err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(feature = "mcp")]
impl From<McpError> for Error {
    fn from(err: McpError) -> Self {
        Self::Mcp(err.to_string())
    }
}

impl From<MediatorError> for Error {
    fn from(err: MediatorError) -> Self {
        match err {
            MediatorError::MalformedArguments { tool_name, message } => {
                Self::InvalidArguments(format!("{}: {}", tool_name, message))
            }
            MediatorError::Execution { tool_name, source } => {
                Self::Tool(format!("{}: {}", tool_name, source))
            }
            MediatorError::Policy(e) => e.into(),
            MediatorError::Audit(e) => e.into(),
            MediatorError::NoCatalog => Self::Config("no tool catalog configured".to_string()),
            MediatorError::Catalog(e) => e.into(),
        }
    }
}

/// Result type for warden operations
pub type Result<T> = std::result::Result<T, Error>;
