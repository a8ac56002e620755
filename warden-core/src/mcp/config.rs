use super::{McpError, McpServerConfig, McpTransport};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// A Claude-Desktop-style server list: `{"mcpServers": {"name": {...}}}`.
#[derive(Debug, Deserialize)]
pub struct McpConfigFile {
    #[serde(rename = "mcpServers")]
    pub mcp_servers: BTreeMap<String, McpServerEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct McpServerEntry {
    /// `stdio` (default), `http`, or the legacy `sse`
    #[serde(rename = "type", default)]
    pub server_type: Option<String>,
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    pub url: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl McpServerEntry {
    fn into_config(self, name: &str) -> Result<McpServerConfig, McpError> {
        let missing = |field: &str| McpError::Config(format!("Server '{}': missing '{}'", name, field));

        let transport = match self.server_type.as_deref().unwrap_or("stdio") {
            "stdio" => McpTransport::Stdio {
                command: self.command.ok_or_else(|| missing("command"))?,
                args: self.args,
                env: self.env,
            },
            "http" | "sse" => McpTransport::Http {
                url: self.url.ok_or_else(|| missing("url"))?,
                headers: self.headers,
            },
            other => {
                return Err(McpError::Config(format!(
                    "Server '{}': unknown transport type '{}'",
                    name, other
                )))
            }
        };
        Ok(McpServerConfig::new(name, transport))
    }
}

/// Load every server from an `mcpServers` JSON file, ordered by name.
///
/// `~` in the path is expanded. Inside the file, `${VAR}` and
/// `${VAR:-default}` are replaced from the environment before parsing.
pub async fn load_config_file(path: impl AsRef<Path>) -> Result<Vec<McpServerConfig>, McpError> {
    let path_str = path.as_ref().to_string_lossy().to_string();
    let expanded_path = shellexpand::tilde(&path_str);

    let content = tokio::fs::read_to_string(Path::new(expanded_path.as_ref())).await?;
    let config: McpConfigFile = serde_json::from_str(&expand_env_vars(&content))?;

    config
        .mcp_servers
        .into_iter()
        .map(|(name, entry)| entry.into_config(&name))
        .collect()
}

/// Replace `${VAR}` (empty when unset) and `${VAR:-default}`.
/// A `$` not followed by `{`, or an unterminated `${`, is kept literally.
fn expand_env_vars(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };

        let expr = &after[..end];
        let (var, default) = match expr.split_once(":-") {
            Some((var, default)) => (var, default),
            None => (expr, ""),
        };
        match std::env::var(var) {
            Ok(value) => output.push_str(&value),
            Err(_) => output.push_str(default),
        }
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("WARDEN_TEST_ROOT", "/srv/files");
        std::env::remove_var("WARDEN_TEST_UNSET");

        assert_eq!(
            expand_env_vars("root=${WARDEN_TEST_ROOT}/data"),
            "root=/srv/files/data"
        );
        assert_eq!(expand_env_vars("${WARDEN_TEST_UNSET:-8080}"), "8080");
        assert_eq!(expand_env_vars("[${WARDEN_TEST_UNSET}]"), "[]");
        assert_eq!(expand_env_vars(r#"{"$schema": "x"}"#), r#"{"$schema": "x"}"#);
        assert_eq!(expand_env_vars("tail ${OPEN"), "tail ${OPEN");
    }

    #[test]
    fn test_entry_defaults_to_stdio() {
        let entry: McpServerEntry =
            serde_json::from_str(r#"{"command": "python", "args": ["server.py"]}"#).unwrap();
        let config = entry.into_config("files").unwrap();

        assert_eq!(config.name, "files");
        assert_eq!(
            config.transport,
            McpTransport::stdio("python").arg("server.py").build()
        );
    }

    #[test]
    fn test_entry_http_and_sse() {
        for kind in ["http", "sse"] {
            let entry = McpServerEntry {
                server_type: Some(kind.to_string()),
                url: Some("https://tools.example.com/mcp".to_string()),
                ..Default::default()
            };
            let config = entry.into_config("remote").unwrap();
            assert!(matches!(config.transport, McpTransport::Http { .. }));
        }
    }

    #[test]
    fn test_entry_errors() {
        let err = McpServerEntry::default().into_config("s").unwrap_err();
        assert!(err.to_string().contains("missing 'command'"));

        let entry = McpServerEntry {
            server_type: Some("carrier-pigeon".to_string()),
            ..Default::default()
        };
        assert!(matches!(entry.into_config("s"), Err(McpError::Config(_))));
    }

    #[tokio::test]
    async fn test_load_config_file() {
        std::env::set_var("WARDEN_TEST_TOKEN", "secret");
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("servers.json");
        std::fs::write(
            &path,
            r#"{"mcpServers": {
                "remote": {"type": "http", "url": "https://x/mcp", "headers": {"Authorization": "Bearer ${WARDEN_TEST_TOKEN}"}},
                "files": {"command": "python", "args": ["file_server.py"]}
            }}"#,
        )
        .unwrap();

        let servers = load_config_file(&path).await.unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].name, "files");
        let McpTransport::Http { headers, .. } = &servers[1].transport else {
            panic!("expected http transport");
        };
        assert_eq!(headers["Authorization"], "Bearer secret");
    }
}
