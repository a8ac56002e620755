//! Mock MCP file server for integration tests
//!
//! Speaks newline-delimited JSON-RPC on stdio and keeps its "files" in
//! memory for the life of the process. Offers:
//! - tools: read_file, write_file, delete_file, execute_command (simulated)
//! - resources: file://config/permissions, file://audit/log
//! - prompts: security_review

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(json!({"code": code, "message": message.into()})),
        }
    }
}

fn text_result(text: impl Into<String>, is_error: bool) -> Value {
    json!({
        "content": [{"type": "text", "text": text.into()}],
        "isError": is_error
    })
}

fn path_schema(extra: Value) -> Value {
    let mut properties = json!({"filepath": {"type": "string"}});
    if let (Some(props), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        props.extend(extra.clone());
    }
    json!({"type": "object", "properties": properties})
}

struct FileServer {
    files: BTreeMap<String, String>,
}

impl FileServer {
    fn handle(&mut self, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = req.id;
        let result = match req.method.as_str() {
            "initialize" => json!({
                "protocolVersion": "2024-11-05",
                "serverInfo": {"name": "mock-file-server", "version": "1.0.0"},
                "capabilities": {"tools": {}, "resources": {}, "prompts": {}}
            }),
            "notifications/initialized" => return None,
            "tools/list" => json!({
                "tools": [
                    {"name": "read_file", "description": "Read a file", "inputSchema": path_schema(json!({}))},
                    {"name": "write_file", "description": "Write a file", "inputSchema": path_schema(json!({"content": {"type": "string"}}))},
                    {"name": "delete_file", "description": "Delete a file", "inputSchema": path_schema(json!({}))},
                    {"name": "execute_command", "description": "Execute a command (simulated)", "inputSchema": {"type": "object", "properties": {"command": {"type": "string"}}}}
                ]
            }),
            "tools/call" => self.call(&req.params),
            "resources/list" => json!({
                "resources": [
                    {"uri": "file://config/permissions", "name": "permissions", "description": "Current permissions configuration"},
                    {"uri": "file://audit/log", "name": "audit_log", "description": "Audit log of all operations"}
                ]
            }),
            "resources/read" => {
                let uri = req.params["uri"].as_str().unwrap_or_default();
                let text = match uri {
                    "file://config/permissions" => serde_json::to_string_pretty(&json!({
                        "read_file": "allow",
                        "write_file": "ask",
                        "delete_file": "deny",
                        "execute_command": "deny"
                    }))
                    .unwrap_or_default(),
                    "file://audit/log" => "No audit log entries yet.".to_string(),
                    other => {
                        return Some(JsonRpcResponse::error(
                            id,
                            -32002,
                            format!("Resource not found: {}", other),
                        ))
                    }
                };
                json!({"contents": [{"uri": uri, "mimeType": "text/plain", "text": text}]})
            }
            "prompts/list" => json!({
                "prompts": [{
                    "name": "security_review",
                    "description": "Security review of an operation",
                    "arguments": [
                        {"name": "operation", "required": true},
                        {"name": "risk_level", "required": true}
                    ]
                }]
            }),
            "prompts/get" => {
                let args = &req.params["arguments"];
                json!({
                    "messages": [{
                        "role": "user",
                        "content": {
                            "type": "text",
                            "text": format!(
                                "Review this operation for security implications:\n\nOperation: {}\nRisk Level: {}",
                                args["operation"].as_str().unwrap_or_default(),
                                args["risk_level"].as_str().unwrap_or_default()
                            )
                        }
                    }]
                })
            }
            other => {
                return Some(JsonRpcResponse::error(
                    id,
                    -32601,
                    format!("Method not found: {}", other),
                ))
            }
        };
        Some(JsonRpcResponse::success(id, result))
    }

    fn call(&mut self, params: &Value) -> Value {
        let args = &params["arguments"];
        let filepath = args["filepath"].as_str().unwrap_or_default().to_string();

        match params["name"].as_str().unwrap_or_default() {
            "read_file" => match self.files.get(&filepath) {
                Some(content) => text_result(content.clone(), false),
                None => text_result(format!("File {} not found", filepath), true),
            },
            "write_file" => {
                let content = args["content"].as_str().unwrap_or_default().to_string();
                self.files.insert(filepath.clone(), content);
                text_result(format!("Successfully wrote to {}", filepath), false)
            }
            "delete_file" => match self.files.remove(&filepath) {
                Some(_) => text_result(format!("Successfully deleted {}", filepath), false),
                None => text_result(format!("File {} not found", filepath), true),
            },
            "execute_command" => text_result(
                format!(
                    "Simulated execution of command: {}",
                    args["command"].as_str().unwrap_or_default()
                ),
                false,
            ),
            other => text_result(format!("Unknown tool: {}", other), true),
        }
    }
}

fn main() {
    let mut server = FileServer {
        files: BTreeMap::new(),
    };
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(req) => server.handle(req),
            Err(e) => Some(JsonRpcResponse::error(None, -32700, format!("Parse error: {}", e))),
        };

        if let Some(resp) = response {
            let Ok(json) = serde_json::to_string(&resp) else {
                break;
            };
            if writeln!(stdout, "{}", json).and_then(|_| stdout.flush()).is_err() {
                break;
            }
        }
    }
}
