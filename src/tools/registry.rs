//! Tool Registry
//!
//! Information Hiding:
//! - Tool storage and lookup implementation hidden
//! - Prompt rendering of the tool catalogue abstracted

use super::Tool;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tool registry for the tools an agent may call, keyed by name.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Register a new tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.metadata().name;
        tracing::debug!("Registering tool: {}", name);
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Get tool metadata as formatted string for LLM prompts
    pub fn tools_description(&self) -> String {
        let mut descriptions = Vec::new();
        for tool in self.tools.values() {
            let metadata = tool.metadata();
            let params = metadata
                .parameters
                .iter()
                .map(|p| {
                    let required = if p.required { "required" } else { "optional" };
                    format!("  - {} ({}): {} [{}]", p.name, p.param_type, p.description, required)
                })
                .collect::<Vec<_>>()
                .join("\n");

            descriptions.push(format!(
                "Tool: {}\nDescription: {}\nParameters:\n{}",
                metadata.name, metadata.description, params
            ));
        }
        descriptions.join("\n\n")
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolMetadata, ToolParameter, ToolResult};
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::Value;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn metadata(&self) -> ToolMetadata {
            ToolMetadata {
                name: self.0.to_string(),
                description: format!("{} tool", self.0),
                parameters: vec![ToolParameter {
                    name: "a".to_string(),
                    param_type: "number".to_string(),
                    description: "first operand".to_string(),
                    required: true,
                }],
            }
        }

        async fn execute(&self, _args: Value) -> Result<ToolResult> {
            Ok(ToolResult::success(self.0))
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let registry = ToolRegistry::from_tools(vec![
            Arc::new(NamedTool("add")) as Arc<dyn Tool>,
            Arc::new(NamedTool("get_weather")),
        ]);

        assert_eq!(registry.len(), 2);
        assert!(registry.has_tool("add"));
        assert!(registry.get("get_weather").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.tool_names(), vec!["add", "get_weather"]);
    }

    #[test]
    fn test_tools_description() {
        let registry = ToolRegistry::from_tools(vec![Arc::new(NamedTool("add")) as Arc<dyn Tool>]);
        let description = registry.tools_description();

        assert!(description.contains("Tool: add"));
        assert!(description.contains("Description: add tool"));
        assert!(description.contains("  - a (number): first operand [required]"));
    }
}
