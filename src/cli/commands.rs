use clap::Parser;

#[derive(Parser)]
#[command(name = "mcp-agent")]
#[command(author, version, about = "Answer questions with calculator and weather MCP tool servers", long_about = None)]
pub struct McpAgentCli {
    /// Run the five demonstration queries instead of the interactive prompt
    #[arg(long)]
    pub test: bool,

    /// Configuration file name under ./config (default: $CONFIG_ENV or "default")
    #[arg(short = 'c', long)]
    pub config: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser)]
#[command(name = "research-agent")]
#[command(author, version, about = "Route questions to a calculator or a web search", long_about = None)]
pub struct ResearchAgentCli {
    /// Configuration file name under ./config (default: $CONFIG_ENV or "default")
    #[arg(short = 'c', long)]
    pub config: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
