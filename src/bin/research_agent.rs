use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use toolroute::cli::ResearchAgentCli;
use toolroute::session::{self, SessionText, TerminalConsole};
use toolroute::{utils, AppContext, Settings};

const SESSION_TEXT: SessionText = SessionText {
    app_name: "Research Agent",
    result_heading: "📋 RESULT:",
    frame_result: true,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = ResearchAgentCli::parse();

    utils::print_banner("RESEARCH AGENT CLI TOOL");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            utils::print_error(&format!("\n❌ Fatal error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: ResearchAgentCli) -> Result<ExitCode> {
    let settings = Settings::load("config", cli.config.as_deref())?;
    utils::init_logging(&settings.logging.level, cli.verbose);

    let api_key = match Settings::api_key() {
        Ok(key) => key,
        Err(e) => {
            utils::print_error(&format!("\n❌ Error initializing agent: {}", e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let temperature = settings.llm.research_temperature;
    let ctx = AppContext::with_llm_client(settings, api_key, temperature);
    let workflow = ctx.research_workflow(ctx.search_service());

    let mut console = TerminalConsole::new(SESSION_TEXT);
    let summary = session::run(&workflow, &mut console, "\n🔎 Enter your query: ").await?;
    tracing::info!("Session finished after {} turns", summary.turns);

    Ok(ExitCode::SUCCESS)
}
