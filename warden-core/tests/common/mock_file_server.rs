//! Helpers for spawning the mock MCP file server binary.

use warden_core::mcp::{McpClient, McpServerConfig, McpTransport};

/// Path to the mock server built alongside the tests
pub fn command() -> String {
    env!("CARGO_BIN_EXE_mock_file_server").to_string()
}

/// A client for a fresh mock server process
pub fn client(name: &str) -> McpClient {
    McpClient::new(McpServerConfig::new(
        name,
        McpTransport::stdio(command()).build(),
    ))
}
