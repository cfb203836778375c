mod settings;

pub use settings::{
    AgentConfig, LLMConfig, LoggingConfig, McpConfig, ResearchConfig, Settings,
};
