use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use warden_cli::{resolve_config, resolve_server, run_cli};
use warden_core::mcp::McpClient;
use warden_core::ToolMediator;

/// Warden - permission-gated tool calls with human approval and an audit trail
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding permissions.json and audit.log
    #[arg(long, env = "WARDEN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Warden configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MCP servers file (`mcpServers` JSON), used when no server command is given
    #[arg(long)]
    mcp_config: Option<PathBuf>,

    /// Server to use from --mcp-config
    #[arg(short, long, requires = "mcp_config")]
    server: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Tool server to launch over stdio, followed by its arguments
    #[arg(value_name = "SERVER_COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(cli.config.as_deref(), cli.data_dir.as_deref())?;
    let server = resolve_server(&cli.command, cli.mcp_config.as_deref(), cli.server.as_deref()).await?;
    let provider = server.name.clone();

    let client = Arc::new(McpClient::new(server));
    client
        .connect()
        .await
        .with_context(|| format!("failed to start tool server '{}'", provider))?;

    let mediator = ToolMediator::from_config(&config, client.clone())
        .context("failed to open policy store")?
        .with_catalog(client.clone());

    let result = run_cli(&mediator, &provider).await;

    if let Err(e) = client.disconnect().await {
        log::warn!("Failed to disconnect from {}: {}", provider, e);
    }
    result?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
