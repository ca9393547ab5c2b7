//! Schema building errors.

use gqlcost_core::DiagnosticBag;
use thiserror::Error;

/// Error returned when SDL cannot be turned into a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The SDL did not parse.
    #[error("schema has {} syntax error(s)", .0.error_count())]
    Syntax(DiagnosticBag),

    /// The SDL parsed but describes an invalid schema.
    #[error("schema has {} error(s)", .0.error_count())]
    Invalid(DiagnosticBag),
}

impl SchemaError {
    /// Returns the diagnostics explaining the failure.
    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticBag {
        match self {
            Self::Syntax(bag) | Self::Invalid(bag) => bag,
        }
    }
}
