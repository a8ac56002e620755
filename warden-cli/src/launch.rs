//! Resolving the command line into a configuration and a tool provider

use crate::error::CliError;
use std::path::Path;
use warden_core::mcp::{load_config_file, McpServerConfig, McpTransport};
use warden_core::WardenConfig;

/// Load the warden configuration, letting an explicit data directory win.
pub fn resolve_config(
    config_file: Option<&Path>,
    data_dir: Option<&Path>,
) -> Result<WardenConfig, CliError> {
    let config = match config_file {
        Some(path) => WardenConfig::load(path)?,
        None => WardenConfig::default(),
    };
    Ok(match data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    })
}

/// Name shown for a server launched from a command line: the file stem.
pub fn server_name(command: &str) -> String {
    Path::new(command)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(command)
        .to_string()
}

/// Pick the tool provider.
///
/// A server command on the command line takes precedence; otherwise the
/// named (or only) entry of an `mcpServers` file is used.
pub async fn resolve_server(
    command: &[String],
    mcp_config: Option<&Path>,
    server: Option<&str>,
) -> Result<McpServerConfig, CliError> {
    if let Some((program, args)) = command.split_first() {
        let transport = McpTransport::launch(program, args.iter().cloned());
        return Ok(McpServerConfig::new(server_name(program), transport));
    }

    let Some(path) = mcp_config else {
        return Err(CliError::Usage(
            "warden [OPTIONS] <SERVER_COMMAND> [ARGS]... (or --mcp-config FILE)".into(),
        ));
    };

    let mut servers = load_config_file(path).await?;
    match server {
        Some(name) => servers
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| CliError::Usage(format!("no server named '{}' in {}", name, path.display()))),
        None if servers.len() == 1 => Ok(servers.remove(0)),
        None if servers.is_empty() => Err(CliError::Usage(format!(
            "no servers defined in {}",
            path.display()
        ))),
        None => {
            let names: Vec<_> = servers.iter().map(|s| s.name.as_str()).collect();
            Err(CliError::Usage(format!(
                "--server is required, choose one of: {}",
                names.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn server_name_uses_file_stem() {
        assert_eq!(server_name("servers/file_server.py"), "file_server");
        assert_eq!(server_name("npx"), "npx");
    }

    #[test]
    fn data_dir_flag_overrides_config_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("warden.json");
        std::fs::write(
            &config_path,
            r#"{"dataDir": "/from/file", "risk": {"deploy": "critical"}}"#,
        )
        .unwrap();

        let config = resolve_config(Some(&config_path), Some(Path::new("/from/flag"))).unwrap();
        assert_eq!(config.data_dir(), PathBuf::from("/from/flag"));
        assert_eq!(config.risk.len(), 1);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = resolve_config(Some(Path::new("/nonexistent/warden.json")), None).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[tokio::test]
    async fn command_line_server_takes_precedence() {
        let command = vec!["file_server.py".to_string(), "--root".to_string()];
        let server = resolve_server(&command, None, None).await.unwrap();
        assert_eq!(server.name, "file_server");
        assert_eq!(
            server.transport,
            McpTransport::stdio("python")
                .args(["file_server.py", "--root"])
                .build()
        );
    }

    #[tokio::test]
    async fn no_provider_is_a_usage_error() {
        let err = resolve_server(&[], None, None).await.unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[tokio::test]
    async fn picks_named_server_from_config_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("mcp.json");
        std::fs::write(
            &path,
            r#"{"mcpServers": {
                "files": {"command": "file-server"},
                "web": {"type": "http", "url": "https://example.com/mcp"}
            }}"#,
        )
        .unwrap();

        let server = resolve_server(&[], Some(&path), Some("web")).await.unwrap();
        assert_eq!(server.name, "web");

        let err = resolve_server(&[], Some(&path), None).await.unwrap_err();
        assert!(err.to_string().contains("files, web"));

        let err = resolve_server(&[], Some(&path), Some("nope")).await.unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }
}
