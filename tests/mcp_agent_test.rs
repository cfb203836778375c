//! Integration tests for the MCP agent
//!
//! The stdio tests launch `sh` scripts that speak just enough line-delimited
//! JSON-RPC to pass for an MCP server. No API keys are needed.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use toolroute::agent::{Agent, AgentReply, McpAgent, DEMO_QUERIES};
use toolroute::config::Settings;
use toolroute::core::llm::{ChatMessage, ChatModel};
use toolroute::core::mcp::{MultiServerClient, ServerSpec, Transport};
use toolroute::session::{Console, Input, SessionEvent};
use toolroute::tools::{Tool, ToolMetadata, ToolProvider, ToolResult};
use toolroute::AppContext;

/// A server offering one tool whose every call returns `reply`.
fn fake_server(tool: &str, description: &str, reply: &str, is_error: bool) -> ServerSpec {
    let init = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": format!("fake-{tool}"), "version": "0.0.1"}
        }
    });
    let tools = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "result": {
            "tools": [{
                "name": tool,
                "description": description,
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "a": {"type": "number", "description": "first operand"},
                        "b": {"type": "number", "description": "second operand"}
                    },
                    "required": ["a", "b"]
                }
            }]
        }
    });
    let call = json!({
        "content": [{"type": "text", "text": reply}],
        "isError": is_error
    });

    let script = format!(
        r#"read -r line
printf '%s\n' '{init}'
read -r line
printf '%s\n' 'fake server ready'
printf '%s\n' '{{"jsonrpc":"2.0","method":"notifications/message","params":{{"level":"info"}}}}'
read -r line
printf '%s\n' '{tools}'
while read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  printf '{{"jsonrpc":"2.0","id":%s,"result":%s}}\n' "$id" '{call}'
done
"#
    );

    ServerSpec {
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script],
        transport: Transport::Stdio,
    }
}

fn fake_servers() -> BTreeMap<String, ServerSpec> {
    BTreeMap::from([
        (
            "calculator".to_string(),
            fake_server("add", "Add two numbers", "100", false),
        ),
        (
            "weather".to_string(),
            fake_server("get_weather", "Get the weather for a city", "Sunny, 20°C", false),
        ),
    ])
}

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
            .ok_or_else(|| anyhow::anyhow!("no scripted reply left"))
    }
}

#[derive(Default)]
struct RecordingConsole {
    events: Vec<SessionEvent>,
}

#[async_trait]
impl Console for RecordingConsole {
    async fn read_line(&mut self, _prompt: &str) -> Result<Input> {
        Ok(Input::Closed)
    }

    fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_multi_server_client_discovers_and_calls_tools() {
    let client = MultiServerClient::new(fake_servers(), Duration::from_secs(10));
    assert_eq!(client.server_names(), vec!["calculator", "weather"]);

    let tools = client.get_tools().await.unwrap();
    let names: Vec<String> = tools.iter().map(|t| t.metadata().name).collect();
    assert_eq!(names, vec!["add", "get_weather"]);

    let add = &tools[0];
    let metadata = add.metadata();
    assert_eq!(metadata.description, "Add two numbers");
    assert_eq!(metadata.parameters.len(), 2);
    assert!(metadata.parameters.iter().all(|p| p.required));

    let result = add.execute(json!({"a": 42, "b": 58})).await.unwrap();
    assert!(result.success);
    assert_eq!(result.output, "100");

    // A second call reuses the same server process.
    let weather = tools[1].execute(json!({"a": 1, "b": 2})).await.unwrap();
    assert_eq!(weather.output, "Sunny, 20°C");
    let again = add.execute(json!({"a": 1, "b": 1})).await.unwrap();
    assert_eq!(again.output, "100");
}

#[cfg(unix)]
#[tokio::test]
async fn test_tool_error_result_becomes_failed_tool_result() {
    let servers = BTreeMap::from([(
        "calculator".to_string(),
        fake_server("divide", "Divide two numbers", "Cannot divide by zero", true),
    )]);
    let client = MultiServerClient::new(servers, Duration::from_secs(10));

    let tools = client.get_tools().await.unwrap();
    let result = tools[0].execute(json!({"a": 1, "b": 0})).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Cannot divide by zero"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_agent_answers_through_mcp_tool() {
    let mut settings = Settings::default();
    settings.mcp.servers = fake_servers();
    let model = ScriptedModel::new(&[
        r#"{"thought": "add them", "action": {"tool": "add", "input": {"a": 42, "b": 58}}, "is_final": false, "final_answer": null}"#,
        r#"{"thought": "done", "action": null, "is_final": true, "final_answer": "42 plus 58 is 100."}"#,
    ]);
    let ctx = AppContext::new(settings, model.clone());

    let agent = ctx.mcp_agent(&ctx.tool_provider()).await.unwrap();
    let names: Vec<&str> = agent.tools().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["add", "get_weather"]);

    let answer = toolroute::TurnHandler::handle(&agent, "What is 42 plus 58?")
        .await
        .unwrap();
    assert_eq!(answer, "42 plus 58 is 100.");

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0][0].content.contains("get_weather"));
    assert!(seen[1]
        .iter()
        .any(|m| m.content.starts_with("Observation: 100")));
}

#[tokio::test]
async fn test_missing_server_binary_fails_initialization() {
    let mut settings = Settings::default();
    settings.mcp.servers = BTreeMap::from([(
        "calculator".to_string(),
        ServerSpec {
            command: "definitely-not-a-real-mcp-server".to_string(),
            args: vec![],
            transport: Transport::Stdio,
        },
    )]);
    let ctx = AppContext::new(settings, ScriptedModel::new(&[]));

    let err = ctx.mcp_agent(&ctx.tool_provider()).await.err().unwrap();

    assert!(format!("{:#}", err).contains("calculator"));
}

struct NamedTool(&'static str);

#[async_trait]
impl Tool for NamedTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: self.0.to_string(),
            description: String::new(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<ToolResult> {
        Ok(ToolResult::success("ok"))
    }
}

struct FixedTools;

#[async_trait]
impl ToolProvider for FixedTools {
    async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        Ok(vec![Arc::new(NamedTool("add")), Arc::new(NamedTool("get_weather"))])
    }
}

/// Answers everything except weather comparisons.
struct PickyAgent;

#[async_trait]
impl Agent for PickyAgent {
    async fn invoke(&self, input: &str) -> Result<AgentReply> {
        if input.starts_with("Compare") {
            return Err(anyhow::anyhow!("weather service timed out"));
        }
        Ok(AgentReply {
            messages: vec![
                ChatMessage::user(input),
                ChatMessage::assistant(format!("answer to {input}")),
            ],
            steps: vec![],
        })
    }
}

#[tokio::test]
async fn test_demo_run_reports_each_query_and_survives_failures() {
    let agent = McpAgent::initialize(&FixedTools, |_| PickyAgent).await.unwrap();
    let mut console = RecordingConsole::default();

    let report = agent.run_demo(&mut console).await;

    assert_eq!(report.completed, 4);
    assert_eq!(report.failed, 1);
    assert_eq!(console.events.len(), DEMO_QUERIES.len() * 2);

    assert_eq!(
        console.events[0],
        SessionEvent::Processing {
            label: Some("Calculator MCP".to_string()),
            query: "What is 42 plus 58?".to_string(),
        }
    );
    assert_eq!(
        console.events[1],
        SessionEvent::TurnResult("answer to What is 42 plus 58?".to_string())
    );
    assert_eq!(
        console.events[7],
        SessionEvent::TurnError("weather service timed out".to_string())
    );
    assert!(matches!(
        &console.events[9],
        SessionEvent::TurnResult(text) if text.contains("20°C in Paris")
    ));
}
