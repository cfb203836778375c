use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use toolroute::agent::McpAgent;
use toolroute::cli::McpAgentCli;
use toolroute::session::{self, SessionText, TerminalConsole};
use toolroute::{utils, AppContext, Settings};

const SESSION_TEXT: SessionText = SessionText {
    app_name: "MCP Agent",
    result_heading: "📋 Result:",
    frame_result: false,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = McpAgentCli::parse();

    utils::print_banner("MCP AGENT CLI TOOL");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            utils::print_error(&format!("\n❌ Fatal error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: McpAgentCli) -> Result<ExitCode> {
    let settings = Settings::load("config", cli.config.as_deref())?;
    utils::init_logging(&settings.logging.level, cli.verbose);

    if cli.test {
        utils::print_info("\n🔄 Initializing MCP Agent...");
    }
    utils::print_info("🔧 Loading tools from MCP servers...");

    let agent = match initialize(settings).await {
        Ok(agent) => agent,
        Err(e) => {
            utils::print_error(&format!("\n❌ Error initializing agent: {:#}", e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut console = TerminalConsole::new(SESSION_TEXT);

    if cli.test {
        utils::print_success("✅ Agent initialized successfully!");
        println!("\n{}", "=".repeat(60));
        utils::print_info("🧪 Running test queries...");
        println!("{}", "=".repeat(60));

        let report = agent.run_demo(&mut console).await;
        tracing::info!(
            "Demo finished: {} completed, {} failed",
            report.completed,
            report.failed
        );
        return Ok(ExitCode::SUCCESS);
    }

    utils::print_success("✅ Agent ready! Type your query or 'exit' to quit.");
    session::run(&agent, &mut console, "\n🔎 Your query: ").await?;
    Ok(ExitCode::SUCCESS)
}

async fn initialize(settings: Settings) -> Result<McpAgent> {
    let api_key = Settings::api_key()?;
    let temperature = settings.llm.temperature;
    let ctx = AppContext::with_llm_client(settings, api_key, temperature);

    let provider = ctx.tool_provider();
    tracing::info!("Connecting to MCP servers: {}", provider.server_names().join(", "));
    ctx.mcp_agent(&provider).await
}
