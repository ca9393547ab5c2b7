//! Static query cost estimation for gqlcost.
//!
//! Fields and types are annotated in the schema with `@cost(complexity: Int)`
//! and `@listCost(assumedSize: Int, arguments: [String!])`. Before a document
//! is executed its cost tree is built from those annotations and the request's
//! arguments, folded into a single number and compared against a budget.
//!
//! The pipeline is:
//! - [`CostTreeBuilder`] walks the document into a [`CostTree`]
//! - [`CostResolver`] folds the tree, resolving fragment spreads by name
//! - [`check_budget`] turns the cost into a [`BudgetOutcome`]
//!
//! [`QueryComplexity`] runs all three against a schema carrying a
//! [`ComplexityConfig`] and records the result in a [`RequestContext`].

pub mod arguments;
pub mod builder;
pub mod config;
pub mod context;
pub mod directive;
pub mod error;
pub mod explain;
pub mod extension;
pub mod gate;
pub mod lint;
pub mod resolver;
pub mod schema;
pub mod tree;

pub use arguments::{resolve_arguments, scaling_multipliers, Variables};
pub use builder::CostTreeBuilder;
pub use config::{ComplexityConfig, ConfigError};
pub use context::{ComplexityResult, RequestContext};
pub use directive::{
    default_cost_compare_key, select_governing, CostCompareKey, CostDirective, FixedCost,
    ListCost, COST_DIRECTIVES_SDL, COST_DIRECTIVE, LIST_COST_DIRECTIVE,
};
pub use error::{ComplexityError, ErrorCode};
pub use explain::{ExplainKind, Explanation};
pub use extension::QueryComplexity;
pub use gate::{check_budget, BudgetOutcome};
pub use lint::lint_cost_directives;
pub use resolver::{node_cost, CostResolver};
pub use schema::CostSchema;
pub use tree::{CostChild, CostNode, CostTree, NodeId, NodeKind};
