//! Toolroute - two small command-line assistants
//!
//! - `mcp-agent` answers questions with a ReAct agent over tools served by
//!   MCP servers (calculator, weather) launched as child processes.
//! - `research-agent` classifies each question by keyword and routes it to a
//!   calculator backed by a chat model or to a web search.
//!
//! Both share the turn-based [`session`] loop.

pub mod actors;
pub mod agent;
pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod research;
pub mod session;
pub mod tools;
pub mod utils;

pub use config::Settings;
pub use context::AppContext;
pub use session::{Console, SessionEvent, SessionSummary, TurnHandler};
