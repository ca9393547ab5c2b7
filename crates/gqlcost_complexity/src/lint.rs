//! Warnings for cost directives that will not behave as written.

use crate::directive::{COST_DIRECTIVE, LIST_COST_DIRECTIVE};
use gqlcost_core::{diagnostics::codes, Diagnostic, DiagnosticBag};
use gqlcost_schema::{AppliedDirective, FieldDef, Schema};

/// Checks every cost directive applied in `schema`.
///
/// Reported as warnings: such directives still load, with the offending
/// arguments treated as unset.
#[must_use]
pub fn lint_cost_directives(schema: &Schema) -> DiagnosticBag {
    let mut bag = DiagnosticBag::new();
    for (type_name, type_def) in schema.types() {
        for directive in type_def.directives() {
            if directive.name == LIST_COST_DIRECTIVE {
                bag.add(warning(
                    type_name,
                    format!("`@{LIST_COST_DIRECTIVE}` has no effect on a type"),
                ));
            }
            lint_directive(&mut bag, type_name, directive);
        }

        for (field_name, field) in type_def.fields().into_iter().flatten() {
            let location = format!("{type_name}.{field_name}");
            for directive in &field.directives {
                lint_directive(&mut bag, &location, directive);
                if directive.name == LIST_COST_DIRECTIVE {
                    lint_scaling_arguments(&mut bag, &location, field, directive);
                }
            }
        }
    }
    bag
}

fn warning(location: &str, message: String) -> Diagnostic {
    Diagnostic::warning(codes::INVALID_COST_DIRECTIVE, "invalid cost directive")
        .with_message(format!("{location}: {message}"))
}

fn lint_directive(bag: &mut DiagnosticBag, location: &str, directive: &AppliedDirective) {
    let integer_arg = match directive.name.as_str() {
        COST_DIRECTIVE => "complexity",
        LIST_COST_DIRECTIVE => "assumedSize",
        _ => return,
    };
    match directive.argument(integer_arg) {
        Some(value) if value.as_i64().is_none() => bag.add(warning(
            location,
            format!("`{integer_arg}` must be an integer, found {value}"),
        )),
        Some(value) if value.as_i64().is_some_and(i64::is_negative) => bag.add(warning(
            location,
            format!("`{integer_arg}` is negative"),
        )),
        _ => {}
    }
}

fn lint_scaling_arguments(
    bag: &mut DiagnosticBag,
    location: &str,
    field: &FieldDef,
    directive: &AppliedDirective,
) {
    let Some(serde_json::Value::Array(names)) = directive.argument("arguments") else {
        return;
    };
    for name in names {
        match name.as_str() {
            Some(name) if !field.arguments.contains_key(name) => bag.add(warning(
                location,
                format!("scaling argument `{name}` is not an argument of the field"),
            )),
            None => bag.add(warning(
                location,
                format!("scaling argument names must be strings, found {name}"),
            )),
            _ => {}
        }
    }
}
