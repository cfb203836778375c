use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::Agent;
use crate::session::{Console, SessionEvent, TurnHandler};
use crate::tools::{Tool, ToolMetadata, ToolProvider};

/// A labelled query for the non-interactive demonstration run.
#[derive(Debug, Clone, Copy)]
pub struct DemoQuery {
    pub name: &'static str,
    pub query: &'static str,
}

pub const DEMO_QUERIES: [DemoQuery; 5] = [
    DemoQuery {
        name: "Calculator MCP",
        query: "What is 42 plus 58?",
    },
    DemoQuery {
        name: "Weather MCP",
        query: "What's the weather in London?",
    },
    DemoQuery {
        name: "Complex Math",
        query: "What's (3 + 5) x 12?",
    },
    DemoQuery {
        name: "Weather in Multiple Cities",
        query: "Compare the weather in New York and Tokyo",
    },
    DemoQuery {
        name: "Mixed Query",
        query: "If it's 20°C in Paris and temperature rises by 5 degrees, what will it be?",
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoReport {
    pub completed: usize,
    pub failed: usize,
}

/// Turn handler backed by a tool-using agent.
///
/// The tool list and the agent are built exactly once, in `initialize`, and
/// are read-only afterwards.
pub struct McpAgent {
    tools: Vec<ToolMetadata>,
    agent: Arc<dyn Agent>,
}

impl McpAgent {
    /// Enumerates tools from `provider` and hands them to `build` to create the agent.
    pub async fn initialize<F, A>(provider: &dyn ToolProvider, build: F) -> Result<Self>
    where
        F: FnOnce(Vec<Arc<dyn Tool>>) -> A,
        A: Agent + 'static,
    {
        let tools = provider.get_tools().await?;
        let metadata: Vec<ToolMetadata> = tools.iter().map(|t| t.metadata()).collect();

        tracing::info!(
            "Agent initialized with {} tools: {}",
            metadata.len(),
            metadata
                .iter()
                .map(|m| m.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            tools: metadata,
            agent: Arc::new(build(tools)),
        })
    }

    pub fn tools(&self) -> &[ToolMetadata] {
        &self.tools
    }

    /// Runs the fixed demonstration queries, printing each result. A failing
    /// query is reported and the run moves on to the next one.
    pub async fn run_demo<C: Console + ?Sized>(&self, console: &mut C) -> DemoReport {
        let mut report = DemoReport::default();

        for demo in DEMO_QUERIES {
            console.emit(SessionEvent::Processing {
                label: Some(demo.name.to_string()),
                query: demo.query.to_string(),
            });

            match self.handle(demo.query).await {
                Ok(result) => {
                    report.completed += 1;
                    console.emit(SessionEvent::TurnResult(result));
                }
                Err(e) => {
                    report.failed += 1;
                    console.emit(SessionEvent::TurnError(format!("{:#}", e)));
                }
            }
        }

        report
    }
}

#[async_trait]
impl TurnHandler for McpAgent {
    async fn handle(&self, query: &str) -> Result<String> {
        let reply = self.agent.invoke(query).await?;
        reply
            .final_text()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("agent returned no messages"))
    }
}
