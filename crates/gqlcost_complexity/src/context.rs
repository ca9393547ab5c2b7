//! Request-scoped state of the validation phase.

use crate::arguments::Variables;
use serde::Serialize;

/// The computed cost of a document and the budget it was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplexityResult {
    pub current: i64,
    pub max: i64,
}

/// Per-request slot holding the inputs of validation and its result.
///
/// One context is created per request and never shared between requests.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub variables: Variables,
    pub operation_name: Option<String>,
    /// Set by validation, for both accepted and rejected documents.
    pub complexity: Option<ComplexityResult>,
}

impl RequestContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Returns the result of the last validation run on this request.
    #[must_use]
    pub fn complexity(&self) -> Option<ComplexityResult> {
        self.complexity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_serializes_flat() {
        let result = ComplexityResult {
            current: 30,
            max: 200,
        };
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({"current": 30, "max": 200})
        );
    }

    #[test]
    fn test_builder() {
        let mut variables = Variables::new();
        variables.insert("limit".to_string(), json!(10));
        let ctx = RequestContext::new()
            .with_variables(variables)
            .with_operation_name("Books");

        assert_eq!(ctx.operation_name.as_deref(), Some("Books"));
        assert_eq!(ctx.variables.get("limit"), Some(&json!(10)));
        assert_eq!(ctx.complexity(), None);
    }
}
