//! What the engine needs to know about a schema.

use crate::config::ComplexityConfig;
use crate::directive::CostDirective;
use gqlcost_schema::{Schema, TypeDef, TypeKind};
use gqlcost_syntax::OperationType;

/// Schema reflection used while building a cost tree.
///
/// Implemented for [`gqlcost_schema::Schema`]; hosts with their own schema
/// representation implement it to reuse the engine.
pub trait CostSchema {
    /// Root type for an operation kind.
    fn root_type(&self, operation: OperationType) -> Option<&str>;

    /// Kind of a named type, `None` if the type does not exist.
    fn type_kind(&self, type_name: &str) -> Option<TypeKind>;

    /// Named result type of `type_name.field_name`, `None` if the field is not declared there.
    fn field_type(&self, type_name: &str, field_name: &str) -> Option<&str>;

    /// Cost directive on the field definition `type_name.field_name`.
    fn field_cost(&self, type_name: &str, field_name: &str) -> Option<CostDirective>;

    /// Cost directive on the type definition itself.
    fn type_cost(&self, type_name: &str) -> Option<CostDirective>;

    /// Object types implementing an interface.
    fn implementers(&self, interface: &str) -> Vec<&str>;

    /// Member types of a union.
    fn union_members(&self, union: &str) -> Vec<&str>;

    /// Engine configuration attached to the schema.
    fn complexity_config(&self) -> Option<&ComplexityConfig>;
}

impl CostSchema for Schema {
    fn root_type(&self, operation: OperationType) -> Option<&str> {
        Schema::root_type(self, operation)
    }

    fn type_kind(&self, type_name: &str) -> Option<TypeKind> {
        self.get_type(type_name).map(TypeDef::kind)
    }

    fn field_type(&self, type_name: &str, field_name: &str) -> Option<&str> {
        self.field(type_name, field_name).map(|f| f.ty.named_type())
    }

    fn field_cost(&self, type_name: &str, field_name: &str) -> Option<CostDirective> {
        CostDirective::first_of(&self.field(type_name, field_name)?.directives)
    }

    fn type_cost(&self, type_name: &str) -> Option<CostDirective> {
        CostDirective::first_of(self.get_type(type_name)?.directives())
    }

    fn implementers(&self, interface: &str) -> Vec<&str> {
        Schema::implementers(self, interface)
            .iter()
            .map(String::as_str)
            .collect()
    }

    fn union_members(&self, union: &str) -> Vec<&str> {
        match self.get_type(union) {
            Some(TypeDef::Union(_)) => self.possible_types(union),
            _ => Vec::new(),
        }
    }

    fn complexity_config(&self) -> Option<&ComplexityConfig> {
        self.extension::<ComplexityConfig>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlcost_schema::SchemaBuilder;

    fn schema() -> Schema {
        SchemaBuilder::from_sdl(
            r#"
            interface Press { title: String }
            type Book implements Press @cost(complexity: 1) {
              title: String @cost(complexity: 1)
              authors: [String] @listCost(assumedSize: 2) @cost(complexity: 5)
            }
            union Search = Book
            type Query { books: [Book] }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_reflection() {
        let schema = schema();
        assert_eq!(CostSchema::root_type(&schema, OperationType::Query), Some("Query"));
        assert_eq!(schema.type_kind("Press"), Some(TypeKind::Interface));
        assert_eq!(schema.type_kind("Missing"), None);
        assert_eq!(schema.field_type("Query", "books"), Some("Book"));
        assert_eq!(schema.field_type("Query", "missing"), None);
        assert_eq!(CostSchema::implementers(&schema, "Press"), vec!["Book"]);
        assert_eq!(schema.union_members("Search"), vec!["Book"]);
        assert!(schema.union_members("Book").is_empty());
    }

    #[test]
    fn test_cost_lookup() {
        let schema = schema();
        assert_eq!(schema.type_cost("Book"), Some(CostDirective::fixed(1)));
        assert_eq!(schema.type_cost("Query"), None);
        assert_eq!(schema.field_cost("Book", "title"), Some(CostDirective::fixed(1)));
        assert!(matches!(
            schema.field_cost("Book", "authors"),
            Some(CostDirective::List(_))
        ));
        assert_eq!(schema.field_cost("Press", "title"), None);
    }

    #[test]
    fn test_config_extension() {
        let schema = schema();
        assert!(schema.complexity_config().is_none());
        let schema = schema.with_extension(ComplexityConfig::new(10));
        assert_eq!(schema.complexity_config().map(|c| c.max_complexity), Some(10));
    }

    #[test]
    fn test_sized_fields_are_ignored() {
        let sdl = format!(
            "{}{}",
            crate::COST_DIRECTIVES_SDL,
            r#"type Query { books: [String] @listCost(assumedSize: 2, sizedFields: ["edges"]) }"#
        );
        let schema = SchemaBuilder::from_sdl(&sdl).unwrap();
        let list_cost = &schema.directives["listCost"];
        assert!(list_cost.arguments.contains_key("sizedFields"));
        assert_eq!(
            schema.field_cost("Query", "books"),
            Some(CostDirective::list(2, Vec::<String>::new()))
        );
        assert!(crate::lint_cost_directives(&schema).is_empty());
    }
}

