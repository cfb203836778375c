//! Calculator and search handlers of the research workflow.

use anyhow::Result;
use std::sync::Arc;

use crate::config::ResearchConfig;
use crate::core::llm::{ChatMessage, ChatModel};
use crate::core::search::{SearchHit, SearchService};
use crate::utils;

const RULE_WIDTH: usize = 50;

/// Answers arithmetic questions by asking the chat model for the bare answer.
///
/// Model failures are returned to the caller; the session loop reports them
/// as a failed turn.
pub struct CalculatorHandler {
    model: Arc<dyn ChatModel>,
}

impl CalculatorHandler {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn handle(&self, query: &str) -> Result<String> {
        utils::print_info(&format!("🧮 Calculating: {}", query));

        let prompt = format!("Calculate and return ONLY the answer: {}", query);
        let response = self.model.chat(vec![ChatMessage::user(prompt)]).await?;

        let answer = response.trim();
        if answer.is_empty() {
            return Err(anyhow::anyhow!("empty answer from reasoning service"));
        }

        utils::print_success("✅ Calculation complete!");
        Ok(format!("\n📊 Calculation result: {}", answer))
    }
}

/// Summarises the top web results for a query.
///
/// Never fails: an empty result set or an unreachable search service still
/// produces a Turn Result.
pub struct SearchHandler {
    service: Arc<dyn SearchService>,
    max_results: usize,
    snippet_chars: usize,
    fallback_topic: String,
}

impl SearchHandler {
    pub fn new(service: Arc<dyn SearchService>, config: &ResearchConfig) -> Self {
        Self {
            service,
            max_results: config.max_results,
            snippet_chars: config.snippet_chars,
            fallback_topic: config.fallback_topic.to_lowercase(),
        }
    }

    pub async fn handle(&self, query: &str) -> String {
        utils::print_info(&format!("🌐 Searching for: {}", query));

        match self.service.text(query, self.max_results).await {
            Ok(hits) if !hits.is_empty() => {
                utils::print_success("✅ Search complete!");
                let lines = hits
                    .iter()
                    .take(self.max_results)
                    .map(|hit| self.format_hit(hit))
                    .collect::<Vec<_>>()
                    .join("\n");
                let rule = "-".repeat(RULE_WIDTH);
                format!("\n🔍 Search results:\n{}\n{}\n{}", rule, lines, rule)
            }
            Ok(_) => {
                if self.mentions_fallback_topic(query) {
                    "\nℹ️  LangGraph is a framework for building stateful, multi-step AI workflows using graphs."
                        .to_string()
                } else {
                    "\n❌ No search results found".to_string()
                }
            }
            Err(e) => {
                tracing::warn!("Search failed for '{}': {}", query, e);
                utils::print_warning(&format!("⚠️  Search error: {}", e));
                if self.mentions_fallback_topic(query) {
                    "\nℹ️  LangGraph is a framework for building stateful AI agents with graphs."
                        .to_string()
                } else {
                    format!(
                        "\n⚠️  Search unavailable, but I can tell you: {} is an interesting topic!",
                        query
                    )
                }
            }
        }
    }

    fn format_hit(&self, hit: &SearchHit) -> String {
        let snippet: String = hit.body.chars().take(self.snippet_chars).collect();
        format!("- {}: {}...", hit.title, snippet)
    }

    fn mentions_fallback_topic(&self, query: &str) -> bool {
        !self.fallback_topic.is_empty() && query.to_lowercase().contains(&self.fallback_topic)
    }
}
