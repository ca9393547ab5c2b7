//! Validation-phase entry point for a request pipeline.

use crate::arguments::Variables;
use crate::builder::CostTreeBuilder;
use crate::config::ComplexityConfig;
use crate::context::{ComplexityResult, RequestContext};
use crate::error::ComplexityError;
use crate::gate::check_budget;
use crate::schema::CostSchema;
use crate::tree::CostTree;
use gqlcost_syntax::Document;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Query complexity admission control.
///
/// The configuration is read from the schema ([`CostSchema::complexity_config`]);
/// all per-request state lives in the [`RequestContext`].
///
/// ```
/// use gqlcost_complexity::{ComplexityConfig, QueryComplexity, RequestContext, COST_DIRECTIVES_SDL};
/// use gqlcost_schema::SchemaBuilder;
/// use gqlcost_syntax::parse;
///
/// let sdl = format!(
///     "{COST_DIRECTIVES_SDL}
///      type Book {{ title: String @cost(complexity: 1) }}
///      type Query {{ books: [Book] @listCost(assumedSize: 10) }}"
/// );
/// let schema = SchemaBuilder::from_sdl(&sdl)
///     .unwrap()
///     .with_extension(ComplexityConfig::new(200).with_report_complexity(true));
///
/// let query = parse("{ books { title } }");
/// let mut ctx = RequestContext::new();
/// let result = QueryComplexity::validate(&schema, &query.document, &mut ctx).unwrap();
/// assert_eq!(result.current, 10);
///
/// let extensions = QueryComplexity::response_extensions(&schema, &ctx).unwrap();
/// assert_eq!(extensions["complexity"]["current"], 10);
/// ```
pub struct QueryComplexity;

impl QueryComplexity {
    /// Estimates the cost of `document` and checks it against the budget.
    ///
    /// The result is stored in `ctx` before a violation is returned, so it is
    /// available to the response step in both cases.
    pub fn validate<S: CostSchema + ?Sized>(
        schema: &S,
        document: &Document<'_>,
        ctx: &mut RequestContext,
    ) -> Result<ComplexityResult, ComplexityError> {
        ctx.complexity = None;
        let Some(config) = schema.complexity_config() else {
            warn!("no complexity configuration attached to the schema");
            return Err(ComplexityError::NotConfigured);
        };

        let current = Self::estimate(
            schema,
            config,
            document,
            &ctx.variables,
            ctx.operation_name.as_deref(),
        );
        let outcome = check_budget(current, config.max_complexity);
        ctx.complexity = Some(outcome.result());

        info!(
            current,
            max = config.max_complexity,
            accepted = outcome.is_pass(),
            "query complexity"
        );
        outcome.into_result()
    }

    /// Builds the cost tree of `document`.
    pub fn build_tree<S: CostSchema + ?Sized>(
        schema: &S,
        config: &ComplexityConfig,
        document: &Document<'_>,
        variables: &Variables,
        operation_name: Option<&str>,
    ) -> CostTree {
        CostTreeBuilder::new(schema, config, document, variables)
            .with_operation_name(operation_name)
            .build()
    }

    /// Returns the total cost of `document` without checking the budget.
    pub fn estimate<S: CostSchema + ?Sized>(
        schema: &S,
        config: &ComplexityConfig,
        document: &Document<'_>,
        variables: &Variables,
        operation_name: Option<&str>,
    ) -> i64 {
        Self::build_tree(schema, config, document, variables, operation_name)
            .resolve(config.default_cost)
    }

    /// Returns `{"complexity": {"current", "max"}}` for the response when
    /// reporting is enabled and validation produced a result.
    pub fn response_extensions<S: CostSchema + ?Sized>(
        schema: &S,
        ctx: &RequestContext,
    ) -> Option<Value> {
        let config = schema.complexity_config()?;
        if !config.report_complexity {
            return None;
        }
        let result = ctx.complexity?;
        Some(json!({ "complexity": result }))
    }
}
