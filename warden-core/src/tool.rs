//! The boundary between the mediator and whatever actually runs tools.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolResult {
    /// Plain text response
    Text(String),

    /// Structured JSON data, used when the provider returned no text
    Json(Value),
}

impl ToolResult {
    /// Create a JSON result from any serializable type
    pub fn json<T: Serialize>(value: T) -> Result<Self, serde_json::Error> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Create a text result from a string
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Get the text content if this is a Text variant, or the JSON rendering
    pub fn as_text(&self) -> String {
        match self {
            ToolResult::Text(s) => s.clone(),
            ToolResult::Json(v) => v.to_string(),
        }
    }

    /// Get a reference to the text content if this is a Text variant
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ToolResult::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a serialized MCP `CallToolResult` into a [`ToolResult`].
    ///
    /// All `text` content items are joined with newlines. A result with no
    /// text items becomes [`ToolResult::Json`] holding the structured
    /// content if present, otherwise the raw content array. A result flagged
    /// `isError` becomes [`ToolError::Failed`].
    pub fn from_call_result(result: &Value) -> Result<Self, ToolError> {
        let content = result
            .get("content")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let texts: Vec<&str> = content
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .collect();

        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            let message = if texts.is_empty() {
                "Tool reported an error".to_string()
            } else {
                texts.join("\n")
            };
            return Err(ToolError::Failed(message));
        }

        if !texts.is_empty() {
            return Ok(Self::Text(texts.join("\n")));
        }

        match result.get("structuredContent") {
            Some(structured) if !structured.is_null() => Ok(Self::Json(structured.clone())),
            _ => Ok(Self::Json(Value::Array(content.to_vec()))),
        }
    }
}

/// Convert strings directly to ToolResult::Text
impl From<String> for ToolResult {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for ToolResult {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Errors that can occur during tool execution
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The tool ran and reported failure
    #[error("Tool failed: {0}")]
    Failed(String),

    /// The tool provider could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The provider answered with something unexpected
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl From<String> for ToolError {
    fn from(s: String) -> Self {
        Self::Custom(s)
    }
}

impl From<&str> for ToolError {
    fn from(s: &str) -> Self {
        Self::Custom(s.to_string())
    }
}

/// Runs a tool call.
///
/// The mediator only calls this after a call has been authorized, and never
/// while holding any of its own locks.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<ToolResult, ToolError>;
}

/// A tool offered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A readable resource offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: Option<String>,
}

/// A prompt template offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDescriptor {
    pub name: String,
    pub description: Option<String>,
    /// Argument names the prompt accepts
    pub arguments: Vec<String>,
}

/// Read-only view of what a provider offers.
///
/// Only `list_tools` is required; providers without resources or prompts
/// can rely on the defaults.
#[async_trait]
pub trait ToolCatalog: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError>;

    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>, ToolError> {
        Ok(Vec::new())
    }

    async fn read_resource(&self, uri: &str) -> Result<String, ToolError> {
        Err(ToolError::Custom(format!("Resource not found: {}", uri)))
    }

    async fn list_prompts(&self) -> Result<Vec<PromptDescriptor>, ToolError> {
        Ok(Vec::new())
    }

    async fn get_prompt(&self, name: &str, _arguments: Value) -> Result<String, ToolError> {
        Err(ToolError::Custom(format!("Prompt not found: {}", name)))
    }
}

// ============================================================================
// Display helpers
// ============================================================================

const MAX_PARAMS: usize = 10;
const MAX_VALUE_LEN: usize = 80;
const MAX_OUTPUT_LINES: usize = 12;

/// Format a JSON value for display, with truncation
fn format_value_preview(value: &Value) -> String {
    match value {
        Value::String(s) => {
            if s.chars().count() > MAX_VALUE_LEN {
                let head: String = s.chars().take(MAX_VALUE_LEN).collect();
                format!("\"{}…\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} keys}}", obj.len()),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}

/// Format tool parameters as plain text, one `key: value` per line
pub fn format_params_plain(tool_name: &str, params: &Value) -> String {
    let mut output = tool_name.to_string();

    if let Some(obj) = params.as_object() {
        for (key, value) in obj.iter().take(MAX_PARAMS) {
            output.push_str(&format!("\n  {}: {}", key, format_value_preview(value)));
        }
        if obj.len() > MAX_PARAMS {
            output.push_str(&format!("\n  … +{} more", obj.len() - MAX_PARAMS));
        }
    }

    output
}

/// Truncate text to max lines, returning (truncated_text, remaining_lines)
fn truncate_lines(text: &str, max_lines: usize) -> (String, usize) {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        (text.to_string(), 0)
    } else {
        let truncated = lines[..max_lines].join("\n");
        (truncated, lines.len() - max_lines)
    }
}

/// Format tool result as plain text
pub fn format_result_plain(result: &ToolResult) -> String {
    let text = match result {
        ToolResult::Text(s) => s.clone(),
        ToolResult::Json(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
    };
    let (truncated, remaining) = truncate_lines(&text, MAX_OUTPUT_LINES);

    if remaining > 0 {
        format!("{}\n… +{} more lines", truncated, remaining)
    } else {
        truncated
    }
}
