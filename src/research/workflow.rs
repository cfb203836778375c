use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::classifier::{classify, QueryType};
use super::handlers::{CalculatorHandler, SearchHandler};
use super::router::{route, HandlerId};
use crate::config::ResearchConfig;
use crate::core::llm::ChatModel;
use crate::core::search::SearchService;
use crate::session::TurnHandler;
use crate::utils;

/// State carried through one pass of the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowState {
    pub query: String,
    pub query_type: Option<QueryType>,
    pub handler: Option<HandlerId>,
    pub result: String,
}

impl WorkflowState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            query_type: None,
            handler: None,
            result: String::new(),
        }
    }
}

/// `classify → (calculator_tool | search_tool) → END`
pub struct ResearchWorkflow {
    calculator: CalculatorHandler,
    search: SearchHandler,
}

impl ResearchWorkflow {
    pub fn new(
        model: Arc<dyn ChatModel>,
        search: Arc<dyn SearchService>,
        config: &ResearchConfig,
    ) -> Self {
        Self {
            calculator: CalculatorHandler::new(model),
            search: SearchHandler::new(search, config),
        }
    }

    pub async fn invoke(&self, query: &str) -> Result<WorkflowState> {
        let mut state = WorkflowState::new(query);

        utils::print_info("\n🔍 Analyzing query type...");
        let query_type = classify(&state.query);
        utils::print_success(&format!(
            "✅ Query classified as: {}",
            query_type.as_str().to_uppercase()
        ));
        state.query_type = Some(query_type);

        let handler = route(query_type);
        match handler {
            HandlerId::Calculator => utils::print_info("➡️  Routing to calculator tool..."),
            HandlerId::Search => utils::print_info("➡️  Routing to search tool..."),
        }
        tracing::debug!("Routing '{}' ({}) to {}", state.query, query_type, handler);
        state.handler = Some(handler);

        state.result = match handler {
            HandlerId::Calculator => self.calculator.handle(&state.query).await?,
            HandlerId::Search => self.search.handle(&state.query).await,
        };

        Ok(state)
    }
}

#[async_trait]
impl TurnHandler for ResearchWorkflow {
    async fn handle(&self, query: &str) -> Result<String> {
        Ok(self.invoke(query).await?.result)
    }
}
