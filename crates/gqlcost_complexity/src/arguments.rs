//! Resolves the integer values of a field's arguments.

use crate::directive::ListCost;
use gqlcost_syntax::{Field, OperationDefinition, Value};

/// Variable values bound for the current request.
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// Resolves every argument of `field` that has an integer value, in query order.
///
/// Per argument, the first match wins:
/// 1. an integer literal;
/// 2. a variable bound in `variables` (only integers and numeric strings count;
///    a bound value of any other type drops the argument);
/// 3. the integer default declared for the variable by `operation`.
#[must_use]
pub fn resolve_arguments(
    field: &Field<'_>,
    operation: Option<&OperationDefinition<'_>>,
    variables: &Variables,
) -> Vec<(String, i64)> {
    field
        .arguments
        .iter()
        .filter_map(|argument| {
            let value = match &argument.value {
                Value::Int(value) => Some(*value),
                Value::Variable(variable) => match variables.get(variable.value) {
                    Some(bound) => integer_value(bound),
                    None => operation
                        .and_then(|op| op.variable(variable.value))
                        .and_then(|def| match def.default_value {
                            Some(Value::Int(default)) => Some(default),
                            _ => None,
                        }),
                },
                _ => None,
            };
            value.map(|value| (argument.name.value.to_string(), value))
        })
        .collect()
}

/// Keeps the resolved values of the directive's scaling arguments, in query order.
#[must_use]
pub fn scaling_multipliers(list_cost: &ListCost, resolved: &[(String, i64)]) -> Vec<i64> {
    resolved
        .iter()
        .filter(|(name, _)| list_cost.is_scaling_argument(name))
        .map(|(_, value)| *value)
        .collect()
}

/// Integer view of a bound variable value. Strings of ASCII digits are coerced.
fn integer_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number.as_i64(),
        serde_json::Value::String(text)
            if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) =>
        {
            text.parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlcost_syntax::{parse, Document, Selection};
    use serde_json::json;

    fn first_field<'d, 'a>(doc: &'d Document<'a>) -> &'d Field<'a> {
        let op = doc.operations().next().unwrap();
        match &op.selection_set.selections[0] {
            Selection::Field(field) => field,
            _ => panic!("expected field"),
        }
    }

    fn vars(value: serde_json::Value) -> Variables {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Variables::new(),
        }
    }

    #[test]
    fn test_literal_wins() {
        let result = parse("query($n: Int = 5) { books(limit: 1000, after: \"x\") }");
        let field = first_field(&result.document);
        let op = result.document.operations().next();
        assert_eq!(
            resolve_arguments(field, op, &vars(json!({"n": 7}))),
            vec![("limit".to_string(), 1000)]
        );
    }

    #[test]
    fn test_bound_variable() {
        let result = parse("query($n: Int = 5) { books(limit: $n) }");
        let field = first_field(&result.document);
        let op = result.document.operations().next();
        assert_eq!(
            resolve_arguments(field, op, &vars(json!({"n": 1000}))),
            vec![("limit".to_string(), 1000)]
        );
    }

    #[test]
    fn test_variable_default() {
        let result = parse("query($n: Int = 1000) { books(limit: $n) }");
        let field = first_field(&result.document);
        let op = result.document.operations().next();
        assert_eq!(
            resolve_arguments(field, op, &Variables::new()),
            vec![("limit".to_string(), 1000)]
        );
        assert!(resolve_arguments(field, None, &Variables::new()).is_empty());
    }

    #[test]
    fn test_non_integer_binding_does_not_fall_back() {
        let result = parse("query($n: Int = 1000) { books(limit: $n) }");
        let field = first_field(&result.document);
        let op = result.document.operations().next();
        for bound in [json!(2.5), json!(null), json!(true), json!("ten"), json!("-3")] {
            assert!(
                resolve_arguments(field, op, &vars(json!({ "n": bound }))).is_empty(),
                "{bound} should not resolve"
            );
        }
    }

    #[test]
    fn test_numeric_string_is_coerced() {
        let result = parse("query($n: Int) { books(limit: $n) }");
        let field = first_field(&result.document);
        assert_eq!(
            resolve_arguments(field, None, &vars(json!({"n": "42"}))),
            vec![("limit".to_string(), 42)]
        );
    }

    #[test]
    fn test_non_integer_default_is_ignored() {
        let result = parse("query($n: String = \"10\") { books(limit: $n) }");
        let field = first_field(&result.document);
        let op = result.document.operations().next();
        assert!(resolve_arguments(field, op, &Variables::new()).is_empty());
    }

    #[test]
    fn test_scaling_multipliers_keep_query_order() {
        let list = ListCost {
            assumed_size: Some(10),
            arguments: vec!["last".to_string(), "first".to_string()],
        };
        let resolved = vec![
            ("first".to_string(), 3),
            ("offset".to_string(), 9),
            ("last".to_string(), 4),
        ];
        assert_eq!(scaling_multipliers(&list, &resolved), vec![3, 4]);
    }
}
