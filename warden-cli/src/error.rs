//! CLI-specific error types

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Mediator operation failed (policy store, audit log, execution)
    #[error("{0}")]
    Mediator(#[from] warden_core::MediatorError),

    /// Catalog query against the tool provider failed
    #[error("Tool provider error: {0}")]
    Tool(#[from] warden_core::ToolError),

    /// Configuration file could not be read or parsed
    #[error("{0}")]
    Config(#[from] warden_core::ConfigError),

    /// MCP server configuration or connection error
    #[error("{0}")]
    Mcp(#[from] warden_core::mcp::McpError),

    /// Readline/input error
    #[error("Input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// IO error (filesystem, stdout, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A command was given the wrong arguments
    #[error("Usage: {0}")]
    Usage(String),
}

impl CliError {
    /// Errors the REPL reports and survives, as opposed to terminal failures.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CliError::Readline(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_are_recoverable() {
        let err = CliError::Usage("/read <uri>".into());
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Usage: /read <uri>");
    }

    #[test]
    fn readline_errors_are_fatal() {
        let err = CliError::from(rustyline::error::ReadlineError::Eof);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn mediator_errors_display_transparently() {
        let err = CliError::from(warden_core::MediatorError::NoCatalog);
        assert_eq!(err.to_string(), "No tool catalog configured");
    }
}
