mod commands;

pub use commands::{McpAgentCli, ResearchAgentCli};
