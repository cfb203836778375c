//! Research assistant: keyword classification routes each query to a
//! calculator (chat model) or a web search.

pub mod classifier;
pub mod handlers;
pub mod router;
pub mod workflow;

pub use classifier::{classify, QueryType};
pub use handlers::{CalculatorHandler, SearchHandler};
pub use router::{route, HandlerId};
pub use workflow::{ResearchWorkflow, WorkflowState};
