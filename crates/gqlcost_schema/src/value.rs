//! Conversion of constant AST values to JSON.

use gqlcost_syntax::Value;
use serde_json::{Map, Number};

/// Converts a constant value to JSON. Variables have no constant value and map to `null`.
#[must_use]
pub fn const_value_to_json(value: &Value<'_>) -> serde_json::Value {
    match value {
        Value::Variable(_) | Value::Null => serde_json::Value::Null,
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Enum(e) => serde_json::Value::String((*e).to_string()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(const_value_to_json).collect()),
        Value::Object(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.value.to_string(), const_value_to_json(value)))
                .collect::<Map<_, _>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlcost_core::Span;
    use gqlcost_syntax::Name;
    use serde_json::json;

    #[test]
    fn test_const_value_to_json() {
        let key = Name {
            value: "size",
            span: Span::default(),
        };
        let value = Value::Object(vec![(
            key,
            Value::List(vec![Value::Int(2), Value::Float(0.5), Value::Enum("LARGE")]),
        )]);
        assert_eq!(const_value_to_json(&value), json!({"size": [2, 0.5, "LARGE"]}));
        assert_eq!(const_value_to_json(&Value::Variable(key)), json!(null));
    }
}
