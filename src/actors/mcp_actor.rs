use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::sync::oneshot;

use crate::actors::messages::*;
use crate::core::mcp::{MCPClient, MCPTool, McpError, ServerSpec, ToolContent};

/// Handle to the task that owns one tool server's stdio session.
///
/// Requests from every tool wrapper are serialised through the actor's
/// channel, so the JSON-RPC stream is never written by two callers at once.
/// The server process is killed once every handle has been dropped.
#[derive(Clone)]
pub struct MCPActorHandle {
    name: String,
    sender: Sender<MCPMessage>,
}

impl MCPActorHandle {
    pub async fn connect(
        name: &str,
        spec: &ServerSpec,
        request_timeout: Duration,
        buffer_size: usize,
    ) -> Result<Self, McpError> {
        let client = MCPClient::connect(name, spec, request_timeout).await?;
        let (sender, receiver) = channel(buffer_size);
        tokio::spawn(mcp_actor(receiver, client));

        Ok(Self {
            name: name.to_string(),
            sender,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn send_message(&self, message: MCPMessage) -> Result<(), McpError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| McpError::ActorGone(self.name.clone()))
    }

    pub async fn list_tools(&self) -> anyhow::Result<Vec<MCPTool>> {
        let (response, rx) = oneshot::channel();
        self.send_message(MCPMessage::ListTools(MCPListTools { response }))
            .await?;

        match rx.await.map_err(|_| McpError::ActorGone(self.name.clone()))? {
            MCPResponse::Tools(tools) => Ok(tools),
            MCPResponse::Error(e) => Err(anyhow::anyhow!(e)),
            other => Err(anyhow::anyhow!("Unexpected MCP response: {:?}", other)),
        }
    }

    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> anyhow::Result<ToolContent> {
        let (response, rx) = oneshot::channel();
        self.send_message(MCPMessage::CallTool(MCPToolCall {
            tool_name: tool_name.to_string(),
            arguments,
            response,
        }))
        .await?;

        match rx.await.map_err(|_| McpError::ActorGone(self.name.clone()))? {
            MCPResponse::Content(content) => Ok(content),
            MCPResponse::Error(e) => Err(anyhow::anyhow!(e)),
            other => Err(anyhow::anyhow!("Unexpected MCP response: {:?}", other)),
        }
    }
}

async fn mcp_actor(mut receiver: Receiver<MCPMessage>, mut client: MCPClient) {
    tracing::info!("MCP actor for '{}' started", client.server_name());

    while let Some(message) = receiver.recv().await {
        handle_mcp_message(&mut client, message).await;
    }

    tracing::info!(
        "MCP actor for '{}' channel closed, shutting down",
        client.server_name()
    );
}

async fn handle_mcp_message(client: &mut MCPClient, message: MCPMessage) {
    match message {
        MCPMessage::ListTools(request) => match client.list_tools().await {
            Ok(tools) => {
                let _ = request.response.send(MCPResponse::Tools(tools));
            }
            Err(e) => {
                tracing::error!("Failed to list tools on '{}': {}", client.server_name(), e);
                let _ = request.response.send(MCPResponse::Error(e.to_string()));
            }
        },
        MCPMessage::CallTool(request) => {
            tracing::debug!(
                "Calling tool '{}' on '{}' with {}",
                request.tool_name,
                client.server_name(),
                request.arguments
            );

            match client.call_tool(&request.tool_name, request.arguments).await {
                Ok(content) => {
                    let _ = request.response.send(MCPResponse::Content(content));
                }
                Err(e) => {
                    tracing::error!("Failed to call tool '{}': {}", request.tool_name, e);
                    let _ = request.response.send(MCPResponse::Error(e.to_string()));
                }
            }
        }
    }
}
