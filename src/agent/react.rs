//! ReAct (Reason + Act) agent
//!
//! Information Hiding:
//! - ReAct loop implementation details hidden
//! - Tool selection logic hidden
//! - Decision parsing tolerant of chatty model output

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{Agent, AgentReply, AgentStep};
use crate::core::llm::{ChatMessage, ChatModel};
use crate::tools::{executor::ToolExecutor, registry::ToolRegistry, Tool};

/// Decision structure returned by LLM
#[derive(Debug, Deserialize, Serialize)]
struct AgentDecision {
    #[serde(default)]
    thought: String,
    action: Option<AgentAction>,
    #[serde(default)]
    is_final: bool,
    final_answer: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct AgentAction {
    tool: String,
    #[serde(default)]
    input: Value,
}

pub struct ReactAgent {
    model: Arc<dyn ChatModel>,
    registry: ToolRegistry,
    executor: ToolExecutor,
    max_iterations: usize,
}

impl ReactAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Vec<Arc<dyn Tool>>,
        executor: ToolExecutor,
        max_iterations: usize,
    ) -> Self {
        Self {
            model,
            registry: ToolRegistry::from_tools(tools),
            executor,
            max_iterations: max_iterations.max(1),
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a helpful assistant that answers questions using tools.\n\n\
             Available Tools:\n{}\n\n\
             IMPORTANT: You MUST respond in this EXACT JSON format:\n\
             {{\n  \
               \"thought\": \"your reasoning about what to do next\",\n  \
               \"action\": {{\"tool\": \"tool_name\", \"input\": {{\"param\": \"value\"}}}},\n  \
               \"is_final\": false,\n  \
               \"final_answer\": null\n\
             }}\n\n\
             When you can answer the user:\n\
             - Set \"is_final\": true\n\
             - Set \"action\": null\n\
             - Put the complete answer for the user in \"final_answer\"\n\n\
             Use a tool for every arithmetic step and every weather lookup; \
             do not guess values a tool can provide.\n\
             Do NOT repeat an action whose result you already have.\n\n\
             Always respond with valid JSON only. No extra text.",
            self.registry.tools_description()
        )
    }

    /// Think step - Ask LLM to reason about next action
    async fn think(&self, conversation: &[ChatMessage]) -> Result<AgentDecision> {
        let response = self.model.chat(conversation.to_vec()).await?;
        Ok(parse_decision(&response))
    }
}

#[async_trait]
impl Agent for ReactAgent {
    async fn invoke(&self, input: &str) -> Result<AgentReply> {
        let mut steps = Vec::new();
        let mut conversation = vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(input),
        ];

        for iteration in 0..self.max_iterations {
            tracing::info!("Agent iteration {}/{}", iteration + 1, self.max_iterations);

            let decision = self.think(&conversation).await.map_err(|e| {
                tracing::error!("Failed to get decision from LLM: {}", e);
                e.context("agent failed to reason about the request")
            })?;

            tracing::debug!("Agent thought: {}", decision.thought);

            if decision.is_final || (decision.action.is_none() && decision.final_answer.is_some()) {
                let final_answer = decision
                    .final_answer
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| decision.thought.clone());

                steps.push(AgentStep {
                    iteration,
                    thought: decision.thought,
                    action: None,
                    observation: None,
                });
                conversation.push(ChatMessage::assistant(final_answer));

                return Ok(AgentReply {
                    messages: conversation.into_iter().skip(1).collect(),
                    steps,
                });
            }

            let Some(action) = decision.action else {
                // Neither an action nor an answer; nudge the model back to the protocol.
                tracing::warn!("Agent returned neither an action nor a final answer");
                conversation.push(ChatMessage::assistant(decision.thought.clone()));
                conversation.push(ChatMessage::user(
                    "Respond with a tool action or set is_final=true with a final_answer.",
                ));
                steps.push(AgentStep {
                    iteration,
                    thought: decision.thought,
                    action: None,
                    observation: None,
                });
                continue;
            };

            tracing::info!("Agent executing tool: {}", action.tool);

            let observation = match self.registry.get(&action.tool) {
                None => format!(
                    "Tool '{}' not found. Available tools: {}",
                    action.tool,
                    self.registry.tool_names().join(", ")
                ),
                Some(tool) => match self.executor.execute(tool, action.input.clone()).await {
                    Ok(result) if result.success => result.output,
                    Ok(result) => format!("Tool failed: {}", result.error.unwrap_or_default()),
                    Err(e) => format!("Tool execution failed: {}", e),
                },
            };

            tracing::debug!("Tool observation: {}", observation);

            conversation.push(ChatMessage::assistant(
                serde_json::to_string(&AgentDecision {
                    thought: decision.thought.clone(),
                    action: Some(action.clone()),
                    is_final: false,
                    final_answer: None,
                })
                .unwrap_or_else(|_| format!("Action: {}", action.tool)),
            ));
            conversation.push(ChatMessage::user(format!(
                "Observation: {}\n\nIf this answers the original question, set is_final=true \
                 and provide final_answer. Otherwise choose the next action.",
                observation
            )));

            steps.push(AgentStep {
                iteration,
                thought: decision.thought,
                action: Some(action.tool),
                observation: Some(observation),
            });
        }

        Err(anyhow::anyhow!(
            "agent stopped after {} iterations without a final answer",
            self.max_iterations
        ))
    }
}

/// Parses the model's JSON decision, digging it out of surrounding prose or
/// code fences when needed. Unparseable text is treated as a final answer.
fn parse_decision(response: &str) -> AgentDecision {
    if let Ok(decision) = serde_json::from_str::<AgentDecision>(response) {
        return decision;
    }

    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            if let Ok(decision) = serde_json::from_str::<AgentDecision>(&response[start..=end]) {
                return decision;
            }
        }
    }

    tracing::warn!("Model reply was not a JSON decision, treating it as the answer");
    AgentDecision {
        thought: String::new(),
        action: None,
        is_final: true,
        final_answer: Some(response.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolConfig, ToolMetadata, ToolResult};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
            self.seen.lock().unwrap().push(messages);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("model unavailable"))
        }
    }

    struct AddTool;

    #[async_trait]
    impl Tool for AddTool {
        fn metadata(&self) -> ToolMetadata {
            ToolMetadata::from_json_schema(
                "add",
                "Add two numbers",
                &json!({
                    "type": "object",
                    "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                    "required": ["a", "b"]
                }),
            )
        }

        async fn execute(&self, args: Value) -> Result<ToolResult> {
            let a = args["a"].as_f64().unwrap_or_default();
            let b = args["b"].as_f64().unwrap_or_default();
            Ok(ToolResult::success(format!("{}", a + b)))
        }
    }

    fn agent(model: Arc<ScriptedModel>, max_iterations: usize) -> ReactAgent {
        ReactAgent::new(
            model,
            vec![Arc::new(AddTool)],
            ToolExecutor::new(ToolConfig {
                timeout_secs: 5,
                max_retries: 1,
            }),
            max_iterations,
        )
    }

    #[tokio::test]
    async fn test_agent_calls_tool_then_answers() {
        let model = ScriptedModel::new(&[
            r#"{"thought": "add them", "action": {"tool": "add", "input": {"a": 42, "b": 58}}, "is_final": false, "final_answer": null}"#,
            r#"{"thought": "done", "action": null, "is_final": true, "final_answer": "42 plus 58 is 100."}"#,
        ]);

        let reply = agent(model.clone(), 5).invoke("What is 42 plus 58?").await.unwrap();

        assert_eq!(reply.final_text(), Some("42 plus 58 is 100."));
        assert_eq!(reply.steps.len(), 2);
        assert_eq!(reply.steps[0].action.as_deref(), Some("add"));
        assert_eq!(reply.steps[0].observation.as_deref(), Some("100"));
        assert_eq!(reply.messages[0], ChatMessage::user("What is 42 plus 58?"));

        let seen = model.seen.lock().unwrap();
        assert!(seen[0][0].content.contains("Tool: add"));
        assert!(seen[1].last().unwrap().content.starts_with("Observation: 100"));
    }

    #[tokio::test]
    async fn test_agent_reports_unknown_tool_to_model() {
        let model = ScriptedModel::new(&[
            r#"{"thought": "", "action": {"tool": "multiply", "input": {}}, "is_final": false}"#,
            r#"{"thought": "", "is_final": true, "final_answer": "fallback"}"#,
        ]);

        let reply = agent(model, 5).invoke("3 x 4").await.unwrap();

        assert_eq!(reply.final_text(), Some("fallback"));
        assert!(reply.steps[0]
            .observation
            .as_deref()
            .unwrap()
            .contains("Tool 'multiply' not found"));
    }

    #[tokio::test]
    async fn test_agent_accepts_plain_text_answer() {
        let model = ScriptedModel::new(&["It is sunny in London."]);
        let reply = agent(model, 5).invoke("weather?").await.unwrap();
        assert_eq!(reply.final_text(), Some("It is sunny in London."));
    }

    #[tokio::test]
    async fn test_agent_propagates_model_failure() {
        let model = ScriptedModel::new(&[]);
        let err = agent(model, 5).invoke("anything").await.unwrap_err();
        assert!(format!("{:#}", err).contains("model unavailable"));
    }

    #[tokio::test]
    async fn test_agent_stops_at_iteration_limit() {
        let call = r#"{"thought": "again", "action": {"tool": "add", "input": {"a": 1, "b": 1}}, "is_final": false}"#;
        let model = ScriptedModel::new(&[call, call, call]);

        let err = agent(model, 2).invoke("loop forever").await.unwrap_err();
        assert!(err.to_string().contains("after 2 iterations"));
    }

    #[test]
    fn test_parse_decision_extracts_fenced_json() {
        let decision = parse_decision(
            "Sure!\n```json\n{\"thought\": \"t\", \"action\": null, \"is_final\": true, \"final_answer\": \"8\"}\n```",
        );
        assert!(decision.is_final);
        assert_eq!(decision.final_answer.as_deref(), Some("8"));
    }
}
