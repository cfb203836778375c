use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::{McpAgent, ReactAgent};
use crate::config::Settings;
use crate::core::llm::{ChatModel, LLMClient};
use crate::core::mcp::MultiServerClient;
use crate::core::search::{DuckDuckGoSearch, SearchService};
use crate::research::ResearchWorkflow;
use crate::tools::{executor::ToolExecutor, ToolConfig, ToolProvider};

/// Everything a program run needs, built once in `main` and passed down by
/// reference.
pub struct AppContext {
    pub settings: Settings,
    pub model: Arc<dyn ChatModel>,
}

impl AppContext {
    pub fn new(settings: Settings, model: Arc<dyn ChatModel>) -> Self {
        Self { settings, model }
    }

    /// Context backed by the OpenAI-compatible client at `temperature`.
    pub fn with_llm_client(settings: Settings, api_key: String, temperature: f32) -> Self {
        let client = LLMClient::new(api_key, settings.llm.clone()).with_temperature(temperature);
        Self::new(settings, Arc::new(client))
    }

    pub fn tool_provider(&self) -> MultiServerClient {
        MultiServerClient::new(
            self.settings.mcp.servers.clone(),
            Duration::from_secs(self.settings.agent.tool_timeout_secs),
        )
    }

    pub fn search_service(&self) -> Arc<dyn SearchService> {
        Arc::new(DuckDuckGoSearch::from_config(&self.settings.research))
    }

    pub fn research_workflow(&self, search: Arc<dyn SearchService>) -> ResearchWorkflow {
        ResearchWorkflow::new(self.model.clone(), search, &self.settings.research)
    }

    /// Loads tools from `provider` and builds the ReAct agent over them.
    pub async fn mcp_agent(&self, provider: &dyn ToolProvider) -> Result<McpAgent> {
        let agent_config = &self.settings.agent;
        let executor = ToolExecutor::new(ToolConfig {
            timeout_secs: agent_config.tool_timeout_secs,
            max_retries: agent_config.tool_max_retries,
        });
        let model = self.model.clone();
        let max_iterations = agent_config.max_iterations;

        McpAgent::initialize(provider, move |tools| {
            ReactAgent::new(model, tools, executor, max_iterations)
        })
        .await
    }
}
