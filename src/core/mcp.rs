use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::actors::mcp_actor::MCPActorHandle;
use crate::tools::{Tool, ToolMetadata, ToolProvider, ToolResult};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// How the client talks to a tool server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Stdio,
    Sse,
    StreamableHttp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Stdio => write!(f, "stdio"),
            Transport::Sse => write!(f, "sse"),
            Transport::StreamableHttp => write!(f, "streamable_http"),
        }
    }
}

/// Launch specification for one tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_transport")]
    pub transport: Transport,
}

fn default_transport() -> Transport {
    Transport::Stdio
}

#[derive(Debug, Error)]
pub enum McpError {
    #[error("failed to launch MCP server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported transport '{transport}' for MCP server '{server}' (only stdio is supported)")]
    UnsupportedTransport { server: String, transport: Transport },

    #[error("I/O error talking to MCP server: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed MCP message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("MCP server returned error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("MCP server '{0}' closed its output")]
    Closed(String),

    #[error("MCP request '{method}' timed out after {secs}s")]
    Timeout { method: String, secs: u64 },

    #[error("MCP server '{0}' is no longer running")]
    ActorGone(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPTool {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_input_schema", rename = "inputSchema", alias = "input_schema")]
    pub input_schema: Value,
}

fn default_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}

/// Flattened result of a `tools/call` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContent {
    pub text: String,
    pub is_error: bool,
}

impl ToolContent {
    fn from_result(result: &Value) -> Result<Self, McpError> {
        let is_error = result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let texts: Vec<&str> = result
            .get("content")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|item| item.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();

        let text = if texts.is_empty() {
            serde_json::to_string_pretty(result)?
        } else {
            texts.join("\n")
        };

        Ok(Self { text, is_error })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MCPResponse {
    jsonrpc: String,
    id: u64,
    result: Option<Value>,
    error: Option<MCPErrorBody>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MCPErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC session with one tool server over its stdin/stdout.
pub struct MCPClient {
    server_name: String,
    // Held so the child is killed when the client is dropped.
    _process: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    request_id: u64,
    request_timeout: Duration,
}

impl MCPClient {
    pub async fn connect(
        server_name: &str,
        spec: &ServerSpec,
        request_timeout: Duration,
    ) -> Result<Self, McpError> {
        if spec.transport != Transport::Stdio {
            return Err(McpError::UnsupportedTransport {
                server: server_name.to_string(),
                transport: spec.transport,
            });
        }

        tracing::info!(
            "[MCPClient] Launching '{}': {} {}",
            server_name,
            spec.command,
            spec.args.join(" ")
        );

        let mut process = Command::new(&spec.command)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| McpError::Spawn {
                server: server_name.to_string(),
                source,
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| McpError::Closed(server_name.to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| McpError::Closed(server_name.to_string()))?;

        if let Some(stderr) = process.stderr.take() {
            let name = server_name.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!("[MCPClient:{}] {}", name, line);
                }
            });
        }

        let mut client = Self {
            server_name: server_name.to_string(),
            _process: process,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            request_id: 0,
            request_timeout,
        };

        client.initialize().await?;
        Ok(client)
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    async fn initialize(&mut self) -> Result<(), McpError> {
        self.request(
            "initialize",
            Some(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
        )
        .await?;

        self.write_message(&json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .await
    }

    pub async fn list_tools(&mut self) -> Result<Vec<MCPTool>, McpError> {
        let result = self.request("tools/list", None).await?;
        let tools = match result.get("tools") {
            Some(tools) => serde_json::from_value(tools.clone())?,
            None => vec![],
        };
        Ok(tools)
    }

    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolContent, McpError> {
        let result = self
            .request(
                "tools/call",
                Some(json!({
                    "name": name,
                    "arguments": arguments
                })),
            )
            .await?;

        ToolContent::from_result(&result)
    }

    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.next_id();
        let mut request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method
        });
        if let Some(params) = params {
            request["params"] = params;
        }

        let limit = self.request_timeout;
        let secs = limit.as_secs();
        let exchange = async {
            self.write_message(&request).await?;
            self.read_response(id).await
        };

        let response = tokio::time::timeout(limit, exchange)
            .await
            .map_err(|_| McpError::Timeout {
                method: method.to_string(),
                secs,
            })??;

        if let Some(error) = response.error {
            return Err(McpError::Remote {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn write_message(&mut self, message: &Value) -> Result<(), McpError> {
        let json = serde_json::to_string(message)?;
        self.stdin.write_all(json.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Reads lines until the response for `id` arrives. Notifications, other
    /// ids and non-JSON noise on stdout are skipped.
    async fn read_response(&mut self, id: u64) -> Result<MCPResponse, McpError> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| McpError::Closed(self.server_name.clone()))?;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = match serde_json::from_str(line) {
                Ok(value) => value,
                Err(_) => {
                    tracing::debug!("[MCPClient:{}] Skipping non-JSON output: {}", self.server_name, line);
                    continue;
                }
            };

            if value.get("id").and_then(Value::as_u64) != Some(id) {
                tracing::trace!("[MCPClient:{}] Skipping message: {}", self.server_name, line);
                continue;
            }

            return Ok(serde_json::from_value(value)?);
        }
    }

    fn next_id(&mut self) -> u64 {
        self.request_id += 1;
        self.request_id
    }
}

// ============================================================================
// MCP Tool Wrapper - exposes a remote tool through the Tool trait
// ============================================================================

pub struct MCPToolWrapper {
    server: MCPActorHandle,
    tool_name: String,
    description: String,
    input_schema: Value,
}

impl MCPToolWrapper {
    pub fn new(server: MCPActorHandle, tool: MCPTool) -> Self {
        Self {
            server,
            tool_name: tool.name,
            description: tool.description.unwrap_or_default(),
            input_schema: tool.input_schema,
        }
    }
}

#[async_trait]
impl Tool for MCPToolWrapper {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::from_json_schema(&self.tool_name, &self.description, &self.input_schema)
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let content = self.server.call_tool(&self.tool_name, args).await?;

        if content.is_error {
            Ok(ToolResult::failure(content.text))
        } else {
            Ok(ToolResult::success(content.text))
        }
    }
}

// ============================================================================
// Multi-server client
// ============================================================================

/// Connects to every configured tool server and exposes their tools as one list.
pub struct MultiServerClient {
    servers: BTreeMap<String, ServerSpec>,
    request_timeout: Duration,
    channel_buffer: usize,
}

impl MultiServerClient {
    pub fn new(servers: BTreeMap<String, ServerSpec>, request_timeout: Duration) -> Self {
        Self {
            servers,
            request_timeout,
            channel_buffer: 32,
        }
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }
}

#[async_trait]
impl ToolProvider for MultiServerClient {
    async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        if self.servers.is_empty() {
            return Err(anyhow::anyhow!("no MCP servers configured"));
        }

        let handles = futures::future::try_join_all(self.servers.iter().map(|(name, spec)| {
            MCPActorHandle::connect(name, spec, self.request_timeout, self.channel_buffer)
        }))
        .await?;

        let mut tools: BTreeMap<String, Arc<dyn Tool>> = BTreeMap::new();
        for handle in handles {
            let listed = handle.list_tools().await?;
            tracing::info!(
                "Found {} tools on MCP server '{}'",
                listed.len(),
                handle.name()
            );

            for mcp_tool in listed {
                let wrapper = MCPToolWrapper::new(handle.clone(), mcp_tool);
                let name = wrapper.tool_name.clone();
                if tools.insert(name.clone(), Arc::new(wrapper)).is_some() {
                    tracing::warn!(
                        "Tool '{}' is offered by more than one server, using '{}'",
                        name,
                        handle.name()
                    );
                }
            }
        }

        Ok(tools.into_values().collect())
    }
}
