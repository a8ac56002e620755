//! MCP (Model Context Protocol) tool provider
//!
//! [`McpClient`] connects to one MCP server and implements both
//! [`ToolExecutor`](crate::ToolExecutor) and [`ToolCatalog`](crate::ToolCatalog),
//! so it can sit directly behind a [`ToolMediator`](crate::ToolMediator).
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden_core::mcp::{McpClient, McpServerConfig, McpTransport};
//! use warden_core::{ToolMediator, WardenConfig};
//!
//! # async fn example() -> warden_core::Result<()> {
//! let client = Arc::new(McpClient::new(McpServerConfig::new(
//!     "files",
//!     McpTransport::launch("file_server.py", Vec::<String>::new()),
//! )));
//! client.connect().await?;
//!
//! let mediator = ToolMediator::from_config(&WardenConfig::default(), client.clone())?
//!     .with_catalog(client);
//! # Ok(())
//! # }
//! ```
//!
//! Servers can also come from a Claude-Desktop-style JSON file, see
//! [`load_config_file`].

mod client;
mod config;
mod transport;

pub use client::McpClient;
pub use config::{load_config_file, McpConfigFile, McpServerEntry};
pub use transport::{HttpBuilder, McpServerConfig, McpTransport, StdioBuilder};

use crate::tool::ToolError;
use thiserror::Error;

/// Errors that can occur during MCP operations
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MCP protocol error: {0}")]
    Protocol(String),
}

impl From<McpError> for ToolError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::Connection(msg) | McpError::Transport(msg) => ToolError::Connection(msg),
            McpError::ToolExecution(msg) => ToolError::Failed(msg),
            McpError::Protocol(msg) => ToolError::Protocol(msg),
            McpError::Io(e) => ToolError::Io(e),
            McpError::Json(e) => ToolError::Serialization(e),
            McpError::Config(msg) => ToolError::Custom(msg),
        }
    }
}
