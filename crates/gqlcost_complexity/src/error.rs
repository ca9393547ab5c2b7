//! Errors surfaced by the validation phase.

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The document costs more than the budget.
    QueryTooComplex,
    /// The schema carries no complexity configuration.
    ComplexityNotConfigured,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::QueryTooComplex => "QUERY_TOO_COMPLEX",
            Self::ComplexityNotConfigured => "COMPLEXITY_NOT_CONFIGURED",
        }
    }

    /// Returns true if the client can fix the error by changing the request.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::QueryTooComplex)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of validation that rejects a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ComplexityError {
    #[error("Complexity of {current} is greater than max complexity of {max}")]
    BudgetExceeded { current: i64, max: i64 },

    /// A server misconfiguration, not a client error.
    #[error("query complexity is not configured for this schema")]
    NotConfigured,
}

impl ComplexityError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::BudgetExceeded { .. } => ErrorCode::QueryTooComplex,
            Self::NotConfigured => ErrorCode::ComplexityNotConfigured,
        }
    }

    /// Renders the error as a GraphQL error object.
    pub fn to_graphql_error(&self) -> Value {
        let mut extensions = serde_json::Map::new();
        if let Self::BudgetExceeded { current, max } = self {
            extensions.insert(
                "complexity".to_string(),
                json!({ "current": current, "max": max }),
            );
        }
        extensions.insert("code".to_string(), json!(self.code().as_str()));

        json!({
            "message": self.to_string(),
            "extensions": extensions,
        })
    }
}
