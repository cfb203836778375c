pub mod mcp_actor;
pub mod messages;

pub use mcp_actor::MCPActorHandle;
