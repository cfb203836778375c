use std::fmt;

use super::classifier::QueryType;

/// Workflow node a classified query continues to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerId {
    Calculator,
    Search,
}

impl HandlerId {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerId::Calculator => "calculator_tool",
            HandlerId::Search => "search_tool",
        }
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditional edge out of the classify node.
pub fn route(query_type: QueryType) -> HandlerId {
    match query_type {
        QueryType::Math => HandlerId::Calculator,
        QueryType::Search => HandlerId::Search,
    }
}
