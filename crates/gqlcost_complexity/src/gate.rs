//! Compares a resolved cost against the budget.

use crate::context::ComplexityResult;
use crate::error::ComplexityError;

/// Result of checking a cost against the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetOutcome {
    Pass(ComplexityResult),
    Violation(ComplexityResult),
}

impl BudgetOutcome {
    /// The `{current, max}` pair, available for both outcomes.
    #[must_use]
    pub const fn result(&self) -> ComplexityResult {
        match self {
            Self::Pass(result) | Self::Violation(result) => *result,
        }
    }

    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass(_))
    }

    /// Converts a violation into a [`ComplexityError::BudgetExceeded`].
    pub fn into_result(self) -> Result<ComplexityResult, ComplexityError> {
        match self {
            Self::Pass(result) => Ok(result),
            Self::Violation(ComplexityResult { current, max }) => {
                Err(ComplexityError::BudgetExceeded { current, max })
            }
        }
    }
}

/// A cost strictly above `max` is a violation.
#[must_use]
pub fn check_budget(current: i64, max: i64) -> BudgetOutcome {
    let result = ComplexityResult { current, max };
    if current > max {
        BudgetOutcome::Violation(result)
    } else {
        BudgetOutcome::Pass(result)
    }
}
