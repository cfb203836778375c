use anyhow::Result;
use async_trait::async_trait;
use std::io::{self, BufRead};
use std::thread;
use tokio::sync::mpsc;

use super::{Console, Input, SessionEvent};
use crate::utils;

/// Per-program wording for the terminal session.
#[derive(Debug, Clone)]
pub struct SessionText {
    /// Name used in the farewell line, e.g. "Research Agent".
    pub app_name: &'static str,
    /// Heading printed above each Turn Result.
    pub result_heading: &'static str,
    /// Frame a result with a line of `=` above the heading.
    pub frame_result: bool,
}

/// Console bound to stdin/stdout with Ctrl+C as the interrupt.
pub struct TerminalConsole {
    lines: mpsc::Receiver<io::Result<String>>,
    text: SessionText,
}

impl TerminalConsole {
    pub fn new(text: SessionText) -> Self {
        Self {
            lines: spawn_stdin_reader(),
            text,
        }
    }
}

/// Reads stdin lines on a plain OS thread and forwards them to the session.
///
/// A read blocked on the terminal cannot be cancelled. Kept off the Tokio
/// blocking pool, it does not hold up runtime shutdown after an interrupt.
fn spawn_stdin_reader() -> mpsc::Receiver<io::Result<String>> {
    let (sender, receiver) = mpsc::channel(1);

    let spawned = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if sender.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        });

    // Without a reader the channel is closed and the session sees end of input.
    if let Err(e) = spawned {
        tracing::error!("Could not start stdin reader: {}", e);
    }

    receiver
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("Could not listen for Ctrl+C");
        std::future::pending::<()>().await
    }
}

#[async_trait]
impl Console for TerminalConsole {
    async fn read_line(&mut self, prompt: &str) -> Result<Input> {
        utils::print_prompt(prompt);

        tokio::select! {
            line = self.lines.recv() => Ok(match line {
                Some(line) => Input::Line(line?),
                None => Input::Closed,
            }),
            _ = ctrl_c() => Ok(Input::Interrupted),
        }
    }

    async fn interrupted(&mut self) {
        ctrl_c().await
    }

    fn emit(&mut self, event: SessionEvent) {
        render(&self.text, event);
    }
}

/// Prints a session event the way both assistants show it on a terminal.
pub fn render(text: &SessionText, event: SessionEvent) {
    match event {
        SessionEvent::Processing { label: None, query } => {
            println!("\n{}", "=".repeat(60));
            utils::print_info(&format!("🔍 Processing: {}", query));
            println!("{}", "=".repeat(60));
        }
        SessionEvent::Processing {
            label: Some(label),
            query,
        } => {
            utils::print_info(&format!("\n🔍 [{}] Processing: {}", label, query));
            println!("{}", "-".repeat(80));
        }
        SessionEvent::InvalidInput => {
            utils::print_warning("⚠️  Please enter a valid query.");
        }
        SessionEvent::TurnResult(result) => {
            if text.frame_result {
                println!("\n{}", "=".repeat(60));
                utils::print_success(text.result_heading);
            } else {
                utils::print_success(&format!("\n{}", text.result_heading));
            }
            println!("{}", "-".repeat(60));
            println!("{}", result);
            println!("{}", "=".repeat(60));
        }
        SessionEvent::TurnError(error) => {
            utils::print_error(&format!("\n❌ An error occurred: {}", error));
        }
        SessionEvent::Farewell => {
            utils::print_success(&format!(
                "\n👋 Thank you for using {}. Goodbye!",
                text.app_name
            ));
        }
        SessionEvent::Cancelled => {
            utils::print_success("\n👋 Operation cancelled by user. Goodbye!");
        }
    }
}
