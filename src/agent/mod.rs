//! Tool-orchestrating agent
//!
//! Information Hiding:
//! - The reasoning loop lives behind the `Agent` trait
//! - Where tools come from lives behind `ToolProvider`
//! - `McpAgent` only enumerates tools once, builds the agent once and
//!   forwards each turn

pub mod mcp_agent;
pub mod react;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::llm::ChatMessage;

pub use mcp_agent::{DemoQuery, DemoReport, McpAgent, DEMO_QUERIES};
pub use react::ReactAgent;

/// One reason/act/observe iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStep {
    pub iteration: usize,
    pub thought: String,
    pub action: Option<String>,
    pub observation: Option<String>,
}

/// Conversation produced by one agent run. The last message is the answer.
#[derive(Debug, Clone, Default)]
pub struct AgentReply {
    pub messages: Vec<ChatMessage>,
    pub steps: Vec<AgentStep>,
}

impl AgentReply {
    pub fn final_text(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}

/// Runs a request to completion, choosing and calling tools as it sees fit.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn invoke(&self, input: &str) -> Result<AgentReply>;
}
