//! Interactive session loop
//!
//! Drives read → handle → print turns against a [`Console`] until the user
//! types an exit keyword, closes input, or interrupts. A failing turn is
//! reported and the loop carries on; only the console itself failing ends
//! the session with an error.

mod console;

use anyhow::Result;
use async_trait::async_trait;

pub use console::{SessionText, TerminalConsole};

/// Inputs that end the session, compared case-insensitively.
pub const EXIT_KEYWORDS: [&str; 2] = ["exit", "quit"];

/// Produces the Turn Result for one query.
#[async_trait]
pub trait TurnHandler: Send + Sync {
    async fn handle(&self, query: &str) -> Result<String>;
}

/// What a console read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Interrupted,
    Closed,
}

/// Everything the loop reports to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Processing {
        label: Option<String>,
        query: String,
    },
    InvalidInput,
    TurnResult(String),
    TurnError(String),
    Farewell,
    Cancelled,
}

/// Where input comes from and where events go.
#[async_trait]
pub trait Console: Send {
    async fn read_line(&mut self, prompt: &str) -> Result<Input>;

    /// Resolves when the user interrupts while a turn is being handled.
    async fn interrupted(&mut self) {
        std::future::pending::<()>().await
    }

    fn emit(&mut self, event: SessionEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Command,
    EndOfInput,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns: usize,
    pub exit: ExitReason,
}

pub fn is_exit_command(input: &str) -> bool {
    EXIT_KEYWORDS
        .iter()
        .any(|keyword| input.eq_ignore_ascii_case(keyword))
}

/// Runs turns until the session ends. Each well-formed line is handled
/// exactly once; the next line is not read until its result is printed.
pub async fn run<H, C>(handler: &H, console: &mut C, prompt: &str) -> Result<SessionSummary>
where
    H: TurnHandler + ?Sized,
    C: Console + ?Sized,
{
    let mut turns = 0;

    let exit = loop {
        let line = match console.read_line(prompt).await? {
            Input::Line(line) => line,
            Input::Interrupted => {
                console.emit(SessionEvent::Cancelled);
                break ExitReason::Interrupted;
            }
            Input::Closed => {
                console.emit(SessionEvent::Farewell);
                break ExitReason::EndOfInput;
            }
        };

        let query = line.trim();

        if is_exit_command(query) {
            console.emit(SessionEvent::Farewell);
            break ExitReason::Command;
        }

        if query.is_empty() {
            console.emit(SessionEvent::InvalidInput);
            continue;
        }

        console.emit(SessionEvent::Processing {
            label: None,
            query: query.to_string(),
        });

        let outcome = tokio::select! {
            result = handler.handle(query) => Some(result),
            _ = console.interrupted() => None,
        };

        let Some(result) = outcome else {
            tracing::info!("Turn interrupted by user");
            console.emit(SessionEvent::Cancelled);
            break ExitReason::Interrupted;
        };

        turns += 1;
        match result {
            Ok(text) => console.emit(SessionEvent::TurnResult(text)),
            Err(e) => {
                tracing::warn!("Turn failed: {:#}", e);
                console.emit(SessionEvent::TurnError(format!("{:#}", e)));
            }
        }
    };

    tracing::debug!("Session ended after {} turns ({:?})", turns, exit);
    Ok(SessionSummary { turns, exit })
}
