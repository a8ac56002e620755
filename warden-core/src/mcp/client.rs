use super::{McpError, McpServerConfig, McpTransport};
use crate::tool::{
    PromptDescriptor, ResourceDescriptor, ToolCatalog, ToolDescriptor, ToolError, ToolExecutor,
    ToolResult,
};
use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, GetPromptRequestParam, ReadResourceRequestParam};
use rmcp::service::RunningService;
use rmcp::transport::streamable_http_client::{
    StreamableHttpClientTransport, StreamableHttpClientTransportConfig,
};
use rmcp::transport::TokioChildProcess;
use rmcp::{RoleClient, ServiceExt};
use serde_json::Value;
use tokio::process::Command;
use tokio::sync::RwLock;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

type Service = RunningService<RoleClient, ()>;

/// One MCP server, connected on first use.
pub struct McpClient {
    config: McpServerConfig,
    service: RwLock<Option<Service>>,
}

impl McpClient {
    pub fn new(config: McpServerConfig) -> Self {
        Self {
            config,
            service: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &McpServerConfig {
        &self.config
    }

    pub async fn is_connected(&self) -> bool {
        self.service.read().await.is_some()
    }

    /// Connect to the server. Calling this while connected does nothing.
    pub async fn connect(&self) -> Result<(), McpError> {
        let mut service_guard = self.service.write().await;
        if service_guard.is_some() {
            return Ok(());
        }

        let service = match &self.config.transport {
            McpTransport::Stdio { command, args, env } => {
                let mut cmd = Command::new(command);
                cmd.args(args).envs(env);

                let transport = TokioChildProcess::new(cmd).map_err(|e| {
                    McpError::Transport(format!("Failed to start {}: {}", command, e))
                })?;
                ().serve(transport).await.map_err(|e| {
                    McpError::Connection(format!("Failed to connect to server: {}", e))
                })?
            }
            McpTransport::Http { url, headers } => {
                let http_client = reqwest::Client::builder()
                    .default_headers(header_map(headers)?)
                    .build()
                    .map_err(|e| {
                        McpError::Transport(format!("Failed to create HTTP client: {}", e))
                    })?;
                let transport = StreamableHttpClientTransport::with_client(
                    http_client,
                    StreamableHttpClientTransportConfig::with_uri(url.clone()),
                );
                ().serve(transport).await.map_err(|e| {
                    McpError::Connection(format!("Failed to connect to {}: {}", url, e))
                })?
            }
        };

        log::info!("Connected to MCP server {}", self.config.name);
        *service_guard = Some(service);
        Ok(())
    }

    /// Close the connection. A later call reconnects.
    pub async fn disconnect(&self) -> Result<(), McpError> {
        if let Some(service) = self.service.write().await.take() {
            service
                .cancel()
                .await
                .map_err(|e| McpError::Connection(format!("Failed to disconnect: {}", e)))?;
            log::info!("Disconnected from MCP server {}", self.config.name);
        }
        Ok(())
    }

    /// Call a tool and return the raw serialized `CallToolResult`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
        self.connect().await?;
        let service_guard = self.service.read().await;
        let service = connected(&service_guard)?;

        let params = CallToolRequestParam {
            name: name.to_string().into(),
            arguments: arguments.as_object().cloned(),
        };
        let result = service
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolExecution(format!("Tool execution failed: {}", e)))?;

        Ok(serde_json::to_value(result)?)
    }

    async fn tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        self.connect().await?;
        let service_guard = self.service.read().await;
        let service = connected(&service_guard)?;

        let result = service
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(format!("Failed to list tools: {}", e)))?;

        Ok(result
            .tools
            .into_iter()
            .filter(|tool| self.config.exposes(&tool.name))
            .map(|tool| ToolDescriptor {
                name: tool.name.to_string(),
                description: tool.description.unwrap_or_default().to_string(),
                input_schema: Value::Object((*tool.input_schema).clone()),
            })
            .collect())
    }

    async fn resources(&self) -> Result<Vec<ResourceDescriptor>, McpError> {
        self.connect().await?;
        let service_guard = self.service.read().await;
        let service = connected(&service_guard)?;

        let result = service
            .list_resources(Default::default())
            .await
            .map_err(|e| McpError::Protocol(format!("Failed to list resources: {}", e)))?;

        let raw = serde_json::to_value(result)?;
        Ok(items(&raw, "resources")
            .iter()
            .filter_map(|resource| {
                let uri = string_field(resource, "uri")?;
                Some(ResourceDescriptor {
                    name: string_field(resource, "name").unwrap_or_else(|| uri.clone()),
                    description: string_field(resource, "description"),
                    uri,
                })
            })
            .collect())
    }

    async fn resource_text(&self, uri: &str) -> Result<String, McpError> {
        self.connect().await?;
        let service_guard = self.service.read().await;
        let service = connected(&service_guard)?;

        let params: ReadResourceRequestParam = serde_json::from_value(serde_json::json!({ "uri": uri }))?;
        let result = service
            .read_resource(params)
            .await
            .map_err(|e| McpError::Protocol(format!("Failed to read {}: {}", uri, e)))?;

        let raw = serde_json::to_value(result)?;
        let texts: Vec<String> = items(&raw, "contents")
            .iter()
            .filter_map(|contents| string_field(contents, "text"))
            .collect();
        Ok(texts.join("\n"))
    }

    async fn prompts(&self) -> Result<Vec<PromptDescriptor>, McpError> {
        self.connect().await?;
        let service_guard = self.service.read().await;
        let service = connected(&service_guard)?;

        let result = service
            .list_prompts(Default::default())
            .await
            .map_err(|e| McpError::Protocol(format!("Failed to list prompts: {}", e)))?;

        let raw = serde_json::to_value(result)?;
        Ok(items(&raw, "prompts")
            .iter()
            .filter_map(|prompt| {
                Some(PromptDescriptor {
                    name: string_field(prompt, "name")?,
                    description: string_field(prompt, "description"),
                    arguments: items(prompt, "arguments")
                        .iter()
                        .filter_map(|arg| string_field(arg, "name"))
                        .collect(),
                })
            })
            .collect())
    }

    async fn prompt_text(&self, name: &str, arguments: Value) -> Result<String, McpError> {
        self.connect().await?;
        let service_guard = self.service.read().await;
        let service = connected(&service_guard)?;

        // Prompt arguments are string-valued
        let arguments: serde_json::Map<String, Value> = arguments
            .as_object()
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| {
                        let text = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                        (k.clone(), Value::String(text))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let params: GetPromptRequestParam = serde_json::from_value(serde_json::json!({
            "name": name,
            "arguments": arguments,
        }))?;
        let result = service
            .get_prompt(params)
            .await
            .map_err(|e| McpError::Protocol(format!("Failed to get prompt {}: {}", name, e)))?;

        let raw = serde_json::to_value(result)?;
        let texts: Vec<String> = items(&raw, "messages")
            .iter()
            .filter_map(|message| message.get("content"))
            .filter_map(|content| string_field(content, "text"))
            .collect();
        Ok(texts.join("\n"))
    }
}

#[async_trait]
impl ToolExecutor for McpClient {
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<ToolResult, ToolError> {
        if !self.config.exposes(tool_name) {
            return Err(ToolError::Custom(format!(
                "Tool {} is not exposed by server {}",
                tool_name, self.config.name
            )));
        }
        let raw = self.call_tool(tool_name, arguments).await?;
        ToolResult::from_call_result(&raw)
    }
}

#[async_trait]
impl ToolCatalog for McpClient {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        Ok(self.tools().await?)
    }

    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>, ToolError> {
        Ok(self.resources().await?)
    }

    async fn read_resource(&self, uri: &str) -> Result<String, ToolError> {
        Ok(self.resource_text(uri).await?)
    }

    async fn list_prompts(&self) -> Result<Vec<PromptDescriptor>, ToolError> {
        Ok(self.prompts().await?)
    }

    async fn get_prompt(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        Ok(self.prompt_text(name, arguments).await?)
    }
}

fn connected(guard: &Option<Service>) -> Result<&Service, McpError> {
    guard
        .as_ref()
        .ok_or_else(|| McpError::Connection("Not connected".to_string()))
}

fn header_map(headers: &std::collections::HashMap<String, String>) -> Result<HeaderMap, McpError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::try_from(key.as_str())
            .map_err(|e| McpError::Config(format!("Invalid header name '{}': {}", key, e)))?;
        let value = HeaderValue::try_from(value.as_str())
            .map_err(|e| McpError::Config(format!("Invalid header value for '{}': {}", key, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn items<'a>(value: &'a Value, field: &str) -> &'a [Value] {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}
