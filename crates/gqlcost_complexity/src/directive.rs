//! Cost directives and the comparator used to pick the governing one.

use gqlcost_schema::AppliedDirective;
use std::fmt;

/// Name of the fixed cost directive, `@cost(complexity: Int)`.
pub const COST_DIRECTIVE: &str = "cost";
/// Name of the list cost directive, `@listCost(assumedSize: Int, arguments: [String!])`.
pub const LIST_COST_DIRECTIVE: &str = "listCost";

/// SDL declaring both cost directives.
///
/// `@listCost` also declares `sizedFields` so that schemas written for other
/// cost analyzers load unchanged. It is accepted and ignored.
pub const COST_DIRECTIVES_SDL: &str = "\
directive @cost(complexity: Int) on FIELD_DEFINITION | OBJECT
directive @listCost(assumedSize: Int, arguments: [String!], sizedFields: [String!]) on FIELD_DEFINITION
";

/// An absolute cost added to the cost of the children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedCost {
    pub complexity: Option<i64>,
}

/// A multiplier applied to the field's own added cost plus its children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListCost {
    /// Multiplier used when no scaling argument resolves at query time.
    pub assumed_size: Option<i64>,
    /// Field arguments whose integer values override `assumed_size`.
    pub arguments: Vec<String>,
}

impl ListCost {
    #[must_use]
    pub fn is_scaling_argument(&self, name: &str) -> bool {
        self.arguments.iter().any(|arg| arg == name)
    }
}

/// A cost annotation attached to a field or a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostDirective {
    Fixed(FixedCost),
    List(ListCost),
}

impl CostDirective {
    #[must_use]
    pub fn fixed(complexity: i64) -> Self {
        Self::Fixed(FixedCost {
            complexity: Some(complexity),
        })
    }

    pub fn list<I, S>(assumed_size: i64, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(ListCost {
            assumed_size: Some(assumed_size),
            arguments: arguments.into_iter().map(Into::into).collect(),
        })
    }

    /// Reads a cost directive back from a directive applied in the schema.
    /// Arguments of the wrong type are treated as unset.
    #[must_use]
    pub fn from_applied(directive: &AppliedDirective) -> Option<Self> {
        let int_arg = |name: &str| directive.argument(name).and_then(serde_json::Value::as_i64);

        match directive.name.as_str() {
            COST_DIRECTIVE => Some(Self::Fixed(FixedCost {
                complexity: int_arg("complexity"),
            })),
            LIST_COST_DIRECTIVE => {
                let arguments = match directive.argument("arguments") {
                    Some(serde_json::Value::Array(items)) => items
                        .iter()
                        .filter_map(serde_json::Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    Some(serde_json::Value::String(single)) => vec![single.clone()],
                    _ => Vec::new(),
                };
                Some(Self::List(ListCost {
                    assumed_size: int_arg("assumedSize"),
                    arguments,
                }))
            }
            _ => None,
        }
    }

    /// Returns the first cost directive in declaration order.
    #[must_use]
    pub fn first_of(directives: &[AppliedDirective]) -> Option<Self> {
        directives.iter().find_map(Self::from_applied)
    }
}

impl fmt::Display for CostDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(FixedCost { complexity }) => {
                write!(f, "@{COST_DIRECTIVE}")?;
                if let Some(complexity) = complexity {
                    write!(f, "(complexity: {complexity})")?;
                }
                Ok(())
            }
            Self::List(list) => {
                write!(f, "@{LIST_COST_DIRECTIVE}")?;
                let mut args = Vec::new();
                if let Some(size) = list.assumed_size {
                    args.push(format!("assumedSize: {size}"));
                }
                if !list.arguments.is_empty() {
                    let names: Vec<_> = list.arguments.iter().map(|a| format!("\"{a}\"")).collect();
                    args.push(format!("arguments: [{}]", names.join(", ")));
                }
                if !args.is_empty() {
                    write!(f, "({})", args.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// Orders candidate directives; the largest key governs.
pub type CostCompareKey = fn(Option<&CostDirective>) -> i64;

/// Ranks "no directive" lowest, then by `assumedSize` or `complexity` (unset counts as 0).
#[must_use]
pub fn default_cost_compare_key(directive: Option<&CostDirective>) -> i64 {
    match directive {
        None => -1,
        Some(CostDirective::List(list)) => list.assumed_size.unwrap_or(0),
        Some(CostDirective::Fixed(fixed)) => fixed.complexity.unwrap_or(0),
    }
}

/// Picks the candidate with the largest key. Ties keep the first maximal
/// candidate; no candidates means no directive.
pub fn select_governing<I>(candidates: I, key: CostCompareKey) -> Option<CostDirective>
where
    I: IntoIterator<Item = Option<CostDirective>>,
{
    let mut best: Option<(i64, Option<CostDirective>)> = None;
    for candidate in candidates {
        let rank = key(candidate.as_ref());
        if best.as_ref().map_or(true, |(top, _)| rank > *top) {
            best = Some((rank, candidate));
        }
    }
    best.and_then(|(_, directive)| directive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_compare_key() {
        assert_eq!(default_cost_compare_key(None), -1);
        assert_eq!(default_cost_compare_key(Some(&CostDirective::fixed(3))), 3);
        assert_eq!(
            default_cost_compare_key(Some(&CostDirective::list(10, ["limit"]))),
            10
        );
        assert_eq!(
            default_cost_compare_key(Some(&CostDirective::Fixed(FixedCost::default()))),
            0
        );
        assert_eq!(
            default_cost_compare_key(Some(&CostDirective::List(ListCost::default()))),
            0
        );
    }

    #[test]
    fn test_select_governing_takes_max() {
        let picked = select_governing(
            [
                Some(CostDirective::fixed(1)),
                None,
                Some(CostDirective::fixed(2)),
            ],
            default_cost_compare_key,
        );
        assert_eq!(picked, Some(CostDirective::fixed(2)));
    }

    #[test]
    fn test_select_governing_ties_keep_first() {
        let picked = select_governing(
            [
                Some(CostDirective::fixed(5)),
                Some(CostDirective::list(5, ["first"])),
            ],
            default_cost_compare_key,
        );
        assert_eq!(picked, Some(CostDirective::fixed(5)));
    }

    #[test]
    fn test_select_governing_empty_or_absent() {
        let empty: Vec<Option<CostDirective>> = Vec::new();
        assert_eq!(select_governing(empty, default_cost_compare_key), None);
        assert_eq!(
            select_governing([None::<CostDirective>, None], default_cost_compare_key),
            None
        );
    }

    #[test]
    fn test_select_governing_custom_key() {
        fn prefer_lists(directive: Option<&CostDirective>) -> i64 {
            match directive {
                Some(CostDirective::List(_)) => 1,
                _ => 0,
            }
        }
        let picked = select_governing(
            [Some(CostDirective::fixed(100)), Some(CostDirective::list(1, ["n"]))],
            prefer_lists,
        );
        assert_eq!(picked, Some(CostDirective::list(1, ["n"])));
    }

    #[test]
    fn test_from_applied() {
        let cost = AppliedDirective::new("cost").with_argument("complexity", json!(4));
        assert_eq!(CostDirective::from_applied(&cost), Some(CostDirective::fixed(4)));

        let list = AppliedDirective::new("listCost")
            .with_argument("assumedSize", json!(10))
            .with_argument("arguments", json!(["first", "last"]));
        assert_eq!(
            CostDirective::from_applied(&list),
            Some(CostDirective::list(10, ["first", "last"]))
        );

        let coerced = AppliedDirective::new("listCost").with_argument("arguments", json!("limit"));
        assert_eq!(
            CostDirective::from_applied(&coerced),
            Some(CostDirective::List(ListCost {
                assumed_size: None,
                arguments: vec!["limit".to_string()],
            }))
        );

        let wrong_type = AppliedDirective::new("cost").with_argument("complexity", json!("high"));
        assert_eq!(
            CostDirective::from_applied(&wrong_type),
            Some(CostDirective::Fixed(FixedCost { complexity: None }))
        );

        assert_eq!(CostDirective::from_applied(&AppliedDirective::new("deprecated")), None);
    }

    #[test]
    fn test_first_of_uses_declaration_order() {
        let directives = vec![
            AppliedDirective::new("deprecated"),
            AppliedDirective::new("listCost").with_argument("assumedSize", json!(2)),
            AppliedDirective::new("cost").with_argument("complexity", json!(9)),
        ];
        assert_eq!(
            CostDirective::first_of(&directives),
            Some(CostDirective::List(ListCost {
                assumed_size: Some(2),
                arguments: Vec::new(),
            }))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(CostDirective::fixed(1).to_string(), "@cost(complexity: 1)");
        assert_eq!(
            CostDirective::list(10, ["limit"]).to_string(),
            r#"@listCost(assumedSize: 10, arguments: ["limit"])"#
        );
        assert_eq!(CostDirective::List(ListCost::default()).to_string(), "@listCost");
    }
}
