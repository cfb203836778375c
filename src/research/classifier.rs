//! Keyword query classification.
//!
//! No model call, no network: a query is `Math` when its lower-cased text
//! contains any arithmetic indicator, otherwise `Search`.

use std::fmt;

/// Category a query is routed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Math,
    Search,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Math => "math",
            QueryType::Search => "search",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substrings that mark a query as arithmetic.
pub const MATH_INDICATORS: &[&str] = &[
    "+", "-", "*", "/", "plus", "minus", "times", "divided", "calculate", "sum", "multiply",
    "add", "subtract",
];

/// Classifies `query`. Total: every input, including `""`, has a category.
pub fn classify(query: &str) -> QueryType {
    let query_lower = query.to_lowercase();

    if MATH_INDICATORS
        .iter()
        .any(|indicator| query_lower.contains(indicator))
    {
        QueryType::Math
    } else {
        QueryType::Search
    }
}
