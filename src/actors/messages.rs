use serde_json::Value;
use tokio::sync::oneshot;

use crate::core::mcp::{MCPTool, ToolContent};

#[derive(Debug)]
pub struct MCPToolCall {
    pub tool_name: String,
    pub arguments: Value,
    pub response: oneshot::Sender<MCPResponse>,
}

#[derive(Debug)]
pub struct MCPListTools {
    pub response: oneshot::Sender<MCPResponse>,
}

#[derive(Debug)]
pub enum MCPResponse {
    Tools(Vec<MCPTool>),
    Content(ToolContent),
    Error(String),
}

#[derive(Debug)]
pub enum MCPMessage {
    ListTools(MCPListTools),
    CallTool(MCPToolCall),
}
