//! Builds a [`Schema`] from SDL.

use crate::error::SchemaError;
use crate::schema::*;
use crate::value::const_value_to_json;
use gqlcost_core::{diagnostics::codes, DiagnosticBag, Span};
use gqlcost_syntax::{self as ast, Definition, Document, OperationType};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

const BUILT_IN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Schema builder.
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
    diagnostics: DiagnosticBag,
    type_spans: FxHashMap<String, Span>,
    root_spans: Vec<(OperationType, Span)>,
    has_schema_definition: bool,
    /// Named type references checked once every definition is known.
    references: Vec<(String, Span)>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// Creates a new schema builder holding the built-in scalars.
    #[must_use]
    pub fn new() -> Self {
        let mut schema = Schema::new();
        for name in BUILT_IN_SCALARS {
            schema.types.insert(
                name.to_string(),
                TypeDef::Scalar(ScalarDef {
                    name: name.to_string(),
                    description: None,
                    directives: Vec::new(),
                }),
            );
        }
        Self {
            schema,
            diagnostics: DiagnosticBag::new(),
            type_spans: FxHashMap::default(),
            root_spans: Vec::new(),
            has_schema_definition: false,
            references: Vec::new(),
        }
    }

    /// Parses SDL and builds a schema from it.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Syntax`] when the text does not parse and
    /// [`SchemaError::Invalid`] when the definitions are inconsistent.
    pub fn from_sdl(sdl: &str) -> Result<Schema, SchemaError> {
        let result = gqlcost_syntax::parse(sdl);
        if result.has_errors() {
            return Err(SchemaError::Syntax(result.diagnostics));
        }
        Self::new().add_document(&result.document).build()
    }

    /// Builds a schema from an already parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Invalid`] when the definitions are inconsistent.
    pub fn from_document(document: &Document<'_>) -> Result<Schema, SchemaError> {
        Self::new().add_document(document).build()
    }

    /// Sets the query type.
    #[must_use]
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.schema.query_type = Some(name.into());
        self.has_schema_definition = true;
        self
    }

    #[must_use]
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.schema.mutation_type = Some(name.into());
        self.has_schema_definition = true;
        self
    }

    #[must_use]
    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.schema.subscription_type = Some(name.into());
        self.has_schema_definition = true;
        self
    }

    /// Adds a type, replacing any type of the same name.
    #[must_use]
    pub fn add_type(mut self, type_def: TypeDef) -> Self {
        self.schema
            .types
            .insert(type_def.name().to_string(), type_def);
        self
    }

    /// Adds every type system definition of `document`. Extensions are applied
    /// after all definitions, so a type may be extended before it is declared.
    #[must_use]
    pub fn add_document(mut self, document: &Document<'_>) -> Self {
        let mut extensions = Vec::new();

        for definition in &document.definitions {
            match definition {
                Definition::Type(def) => self.define_type(def),
                Definition::Directive(def) => self.define_directive(def),
                Definition::Schema(def) => self.define_schema(def),
                Definition::TypeExtension(_) | Definition::SchemaExtension(_) => {
                    extensions.push(definition);
                }
                Definition::Operation(_) | Definition::Fragment(_) => {
                    self.diagnostics.error(
                        codes::INVALID_SYNTAX,
                        "executable definition in schema",
                        definition.span(),
                        "operations and fragments are not allowed in a schema document",
                    );
                }
            }
        }

        for definition in extensions {
            match definition {
                Definition::TypeExtension(def) => self.extend_type(def),
                Definition::SchemaExtension(def) => self.apply_root_operations(def),
                _ => {}
            }
        }
        self
    }

    /// Validates references and finishes the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Invalid`] with every problem found.
    pub fn build(mut self) -> Result<Schema, SchemaError> {
        self.resolve_root_types();

        for (name, span) in std::mem::take(&mut self.references) {
            if !self.schema.types.contains_key(&name) {
                self.diagnostics.error(
                    codes::UNDEFINED_TYPE,
                    format!("undefined type `{name}`"),
                    span,
                    "referenced here",
                );
            }
        }

        if self.diagnostics.has_errors() {
            return Err(SchemaError::Invalid(self.diagnostics));
        }

        let mut implementers: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for type_def in self.schema.types.values() {
            if let TypeDef::Object(obj) = type_def {
                for interface in &obj.implements {
                    implementers
                        .entry(interface.clone())
                        .or_default()
                        .push(obj.name.clone());
                }
            }
        }
        self.schema.implementers = implementers;

        tracing::debug!(
            types = self.schema.types.len(),
            directives = self.schema.directives.len(),
            query = self.schema.query_type.as_deref().unwrap_or("-"),
            "schema built"
        );
        Ok(self.schema)
    }

    fn resolve_root_types(&mut self) {
        if !self.has_schema_definition {
            for (operation, name) in [
                (OperationType::Query, "Query"),
                (OperationType::Mutation, "Mutation"),
                (OperationType::Subscription, "Subscription"),
            ] {
                if matches!(self.schema.get_type(name), Some(TypeDef::Object(_))) {
                    self.set_root(operation, name.to_string());
                }
            }
            return;
        }

        for (operation, span) in std::mem::take(&mut self.root_spans) {
            let Some(name) = self.schema.root_type(operation) else {
                continue;
            };
            if !matches!(self.schema.get_type(name), Some(TypeDef::Object(_))) {
                let name = name.to_string();
                self.diagnostics.error(
                    codes::UNKNOWN_ROOT_TYPE,
                    format!("unknown {} root type `{name}`", operation.as_str()),
                    span,
                    "root operation types must be object types",
                );
            }
        }
    }

    fn set_root(&mut self, operation: OperationType, name: String) {
        match operation {
            OperationType::Query => self.schema.query_type = Some(name),
            OperationType::Mutation => self.schema.mutation_type = Some(name),
            OperationType::Subscription => self.schema.subscription_type = Some(name),
        }
    }

    fn define_schema(&mut self, def: &ast::SchemaDefinition<'_>) {
        if self.has_schema_definition {
            self.diagnostics.error(
                codes::DUPLICATE_TYPE,
                "duplicate schema definition",
                def.span,
                "a schema may only be defined once",
            );
            return;
        }
        self.has_schema_definition = true;
        self.apply_root_operations(def);
    }

    fn apply_root_operations(&mut self, def: &ast::SchemaDefinition<'_>) {
        for op in &def.operations {
            if self.schema.root_type(op.operation).is_some() {
                self.diagnostics.error(
                    codes::INVALID_EXTENSION,
                    format!("{} root type defined twice", op.operation.as_str()),
                    op.span,
                    "already defined",
                );
                continue;
            }
            self.has_schema_definition = true;
            self.set_root(op.operation, op.named_type.value.to_string());
            self.root_spans.push((op.operation, op.named_type.span));
        }
    }

    fn define_type(&mut self, def: &ast::TypeDefinition<'_>) {
        let name = def.name();
        let is_built_in = BUILT_IN_SCALARS.contains(&name.value);

        if let Some(previous) = self.type_spans.get(name.value) {
            let previous = *previous;
            self.diagnostics.add(
                gqlcost_core::Diagnostic::error(
                    codes::DUPLICATE_TYPE,
                    format!("duplicate type `{}`", name.value),
                )
                .with_span(name.span, "defined again here")
                .with_span(previous, "first defined here"),
            );
            return;
        }
        if is_built_in && !matches!(def, ast::TypeDefinition::Scalar(_)) {
            self.diagnostics.error(
                codes::DUPLICATE_TYPE,
                format!("`{}` is a built-in scalar", name.value),
                name.span,
                "cannot redefine a built-in type",
            );
            return;
        }

        self.type_spans.insert(name.value.to_string(), name.span);
        let type_def = self.convert_type_definition(def);
        self.schema.types.insert(name.value.to_string(), type_def);
    }

    fn define_directive(&mut self, def: &ast::DirectiveDefinition<'_>) {
        if self.schema.directives.contains_key(def.name.value) {
            self.diagnostics.error(
                codes::DUPLICATE_TYPE,
                format!("duplicate directive `@{}`", def.name.value),
                def.name.span,
                "defined again here",
            );
            return;
        }
        let arguments = self.convert_input_values(&def.arguments, def.name.value);
        self.schema.directives.insert(
            def.name.value.to_string(),
            DirectiveDefinition {
                name: def.name.value.to_string(),
                description: def.description.clone(),
                arguments,
                locations: def.locations.clone(),
                repeatable: def.repeatable,
            },
        );
    }

    fn extend_type(&mut self, ext: &ast::TypeDefinition<'_>) {
        let name = ext.name();
        let converted = self.convert_type_definition(ext);
        let Some(base) = self.schema.types.get_mut(name.value) else {
            self.diagnostics.error(
                codes::INVALID_EXTENSION,
                format!("cannot extend unknown type `{}`", name.value),
                name.span,
                "no such type",
            );
            return;
        };

        let mut duplicate_fields = Vec::new();
        match (base, converted) {
            (TypeDef::Object(base), TypeDef::Object(ext)) => {
                merge_fields(&mut base.fields, ext.fields, &mut duplicate_fields);
                merge_names(&mut base.implements, ext.implements);
                base.directives.extend(ext.directives);
            }
            (TypeDef::Interface(base), TypeDef::Interface(ext)) => {
                merge_fields(&mut base.fields, ext.fields, &mut duplicate_fields);
                merge_names(&mut base.implements, ext.implements);
                base.directives.extend(ext.directives);
            }
            (TypeDef::Union(base), TypeDef::Union(ext)) => {
                merge_names(&mut base.members, ext.members);
                base.directives.extend(ext.directives);
            }
            (TypeDef::Enum(base), TypeDef::Enum(ext)) => {
                merge_names(&mut base.values, ext.values);
                base.directives.extend(ext.directives);
            }
            (TypeDef::InputObject(base), TypeDef::InputObject(ext)) => {
                for (field_name, field) in ext.fields {
                    if base.fields.contains_key(&field_name) {
                        duplicate_fields.push(field_name);
                    } else {
                        base.fields.insert(field_name, field);
                    }
                }
                base.directives.extend(ext.directives);
            }
            (TypeDef::Scalar(base), TypeDef::Scalar(ext)) => {
                base.directives.extend(ext.directives);
            }
            (base, ext) => {
                let (base_kind, ext_kind) = (base.kind(), ext.kind());
                self.diagnostics.error(
                    codes::INVALID_EXTENSION,
                    format!(
                        "cannot extend {} `{}` with `extend {}`",
                        base_kind.as_str(),
                        name.value,
                        ext_kind.as_str()
                    ),
                    name.span,
                    "kind mismatch",
                );
            }
        }

        for field in duplicate_fields {
            self.diagnostics.error(
                codes::DUPLICATE_FIELD,
                format!("duplicate field `{}.{field}`", name.value),
                name.span,
                "field already defined",
            );
        }
    }

    fn convert_type_definition(&mut self, def: &ast::TypeDefinition<'_>) -> TypeDef {
        let directives = convert_directives(def.directives());
        match def {
            ast::TypeDefinition::Scalar(d) => TypeDef::Scalar(ScalarDef {
                name: d.name.value.to_string(),
                description: d.description.clone(),
                directives,
            }),
            ast::TypeDefinition::Object(d) => TypeDef::Object(ObjectDef {
                name: d.name.value.to_string(),
                description: d.description.clone(),
                fields: self.convert_fields(&d.fields, d.name.value),
                implements: self.reference_names(&d.implements),
                directives,
            }),
            ast::TypeDefinition::Interface(d) => TypeDef::Interface(InterfaceDef {
                name: d.name.value.to_string(),
                description: d.description.clone(),
                fields: self.convert_fields(&d.fields, d.name.value),
                implements: self.reference_names(&d.implements),
                directives,
            }),
            ast::TypeDefinition::Union(d) => TypeDef::Union(UnionDef {
                name: d.name.value.to_string(),
                description: d.description.clone(),
                members: self.reference_names(&d.members),
                directives,
            }),
            ast::TypeDefinition::Enum(d) => TypeDef::Enum(EnumDef {
                name: d.name.value.to_string(),
                description: d.description.clone(),
                values: d.values.iter().map(|v| v.name.value.to_string()).collect(),
                directives,
            }),
            ast::TypeDefinition::InputObject(d) => TypeDef::InputObject(InputObjectDef {
                name: d.name.value.to_string(),
                description: d.description.clone(),
                fields: self.convert_input_values(&d.fields, d.name.value),
                directives,
            }),
        }
    }

    fn convert_fields(
        &mut self,
        fields: &[ast::FieldDefinition<'_>],
        owner: &str,
    ) -> IndexMap<String, FieldDef> {
        let mut out = IndexMap::with_capacity(fields.len());
        for field in fields {
            if out.contains_key(field.name.value) {
                self.diagnostics.error(
                    codes::DUPLICATE_FIELD,
                    format!("duplicate field `{owner}.{}`", field.name.value),
                    field.name.span,
                    "defined again here",
                );
                continue;
            }
            let ty = self.convert_type(&field.ty);
            let arguments = self.convert_input_values(&field.arguments, owner);
            out.insert(
                field.name.value.to_string(),
                FieldDef {
                    name: field.name.value.to_string(),
                    description: field.description.clone(),
                    ty,
                    arguments,
                    directives: convert_directives(&field.directives),
                },
            );
        }
        out
    }

    fn convert_input_values(
        &mut self,
        values: &[ast::InputValueDefinition<'_>],
        owner: &str,
    ) -> IndexMap<String, InputValueDef> {
        let mut out = IndexMap::with_capacity(values.len());
        for value in values {
            if out.contains_key(value.name.value) {
                self.diagnostics.error(
                    codes::DUPLICATE_FIELD,
                    format!("duplicate input value `{owner}.{}`", value.name.value),
                    value.name.span,
                    "defined again here",
                );
                continue;
            }
            let ty = self.convert_type(&value.ty);
            out.insert(
                value.name.value.to_string(),
                InputValueDef {
                    name: value.name.value.to_string(),
                    description: value.description.clone(),
                    ty,
                    default_value: value.default_value.as_ref().map(const_value_to_json),
                },
            );
        }
        out
    }

    fn convert_type(&mut self, ty: &ast::Type<'_>) -> TypeRef {
        match ty {
            ast::Type::Named(name) => {
                self.references.push((name.value.to_string(), name.span));
                TypeRef::named(name.value)
            }
            ast::Type::List(inner, _) => TypeRef::list(self.convert_type(inner)),
            ast::Type::NonNull(inner, _) => TypeRef::non_null(self.convert_type(inner)),
        }
    }

    fn reference_names(&mut self, names: &[ast::Name<'_>]) -> Vec<String> {
        names
            .iter()
            .map(|name| {
                self.references.push((name.value.to_string(), name.span));
                name.value.to_string()
            })
            .collect()
    }
}

fn convert_directives(directives: &[ast::Directive<'_>]) -> Vec<AppliedDirective> {
    directives
        .iter()
        .map(|directive| AppliedDirective {
            name: directive.name.value.to_string(),
            arguments: directive
                .arguments
                .iter()
                .map(|arg| (arg.name.value.to_string(), const_value_to_json(&arg.value)))
                .collect(),
        })
        .collect()
}

fn merge_fields(
    base: &mut IndexMap<String, FieldDef>,
    ext: IndexMap<String, FieldDef>,
    duplicates: &mut Vec<String>,
) {
    for (name, field) in ext {
        if base.contains_key(&name) {
            duplicates.push(name);
        } else {
            base.insert(name, field);
        }
    }
}

fn merge_names(base: &mut Vec<String>, ext: Vec<String>) {
    for name in ext {
        if !base.contains(&name) {
            base.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builds_types_and_roots() {
        let schema = SchemaBuilder::from_sdl(
            "type Query { books(limit: Int = 5): [Book!]! }
             type Book { id: ID! }",
        )
        .unwrap();

        assert_eq!(schema.query_type.as_deref(), Some("Query"));
        assert!(schema.mutation_type.is_none());
        let books = schema.field("Query", "books").unwrap();
        assert_eq!(books.ty.to_string(), "[Book!]!");
        assert!(books.ty.is_list());
        assert_eq!(books.ty.named_type(), "Book");
        assert_eq!(books.arguments["limit"].default_value, Some(json!(5)));
        assert!(schema.get_type("Int").is_some());
    }

    #[test]
    fn test_explicit_schema_definition() {
        let schema = SchemaBuilder::from_sdl(
            "schema { query: Root }
             type Root { ok: Int }
             type Query { ignored: Int }",
        )
        .unwrap();
        assert_eq!(schema.query_type.as_deref(), Some("Root"));
    }

    #[test]
    fn test_unknown_root_type() {
        let err = SchemaBuilder::from_sdl("schema { query: Missing }").unwrap_err();
        let found: Vec<_> = err.diagnostics().errors().map(|d| d.code).collect();
        assert_eq!(found, vec![codes::UNKNOWN_ROOT_TYPE]);
    }

    #[test]
    fn test_applied_directives_keep_arguments() {
        let schema = SchemaBuilder::from_sdl(
            r#"type Query {
                 books: [Int] @listCost(assumedSize: 10, arguments: ["limit"])
               }
               type Book @cost(complexity: 1) { id: ID }"#,
        )
        .unwrap();

        let directive = &schema.field("Query", "books").unwrap().directives[0];
        assert_eq!(directive.name, "listCost");
        assert_eq!(directive.argument("assumedSize"), Some(&json!(10)));
        assert_eq!(directive.argument("arguments"), Some(&json!(["limit"])));

        let book = schema.get_type("Book").unwrap();
        assert_eq!(book.directives()[0].argument("complexity"), Some(&json!(1)));
    }

    #[test]
    fn test_implementers_in_declaration_order() {
        let schema = SchemaBuilder::from_sdl(
            "interface Press { title: String }
             type Magazine implements Press { title: String }
             type Book implements Press { title: String }
             union Search = Book | Magazine
             type Query { press: [Press] }",
        )
        .unwrap();

        assert_eq!(schema.implementers("Press"), ["Magazine", "Book"]);
        assert_eq!(schema.possible_types("Press"), vec!["Magazine", "Book"]);
        assert_eq!(schema.possible_types("Search"), vec!["Book", "Magazine"]);
        assert_eq!(schema.possible_types("Book"), vec!["Book"]);
        assert!(schema.implementers("Book").is_empty());
    }

    #[test]
    fn test_extensions_merge_into_base() {
        let schema = SchemaBuilder::from_sdl(
            "extend type Book implements Node @cost(complexity: 3) { isbn: String }
             interface Node { id: ID }
             type Book { id: ID }
             type Query { book: Book }
             extend union Search = Book
             union Search = Query",
        )
        .unwrap();

        let book = schema.get_type("Book").unwrap();
        let fields: Vec<_> = book.fields().unwrap().keys().cloned().collect();
        assert_eq!(fields, vec!["id", "isbn"]);
        assert_eq!(book.directives().len(), 1);
        assert_eq!(schema.implementers("Node"), ["Book"]);
        assert_eq!(schema.possible_types("Search"), vec!["Query", "Book"]);
    }

    #[test]
    fn test_invalid_extensions() {
        let err = SchemaBuilder::from_sdl(
            "type Query { a: Int }
             extend type Missing { b: Int }
             extend interface Query { c: Int }
             extend type Query { a: Int }",
        )
        .unwrap_err();
        let found: Vec<_> = err.diagnostics().errors().map(|d| d.code).collect();
        assert_eq!(
            found,
            vec![
                codes::INVALID_EXTENSION,
                codes::INVALID_EXTENSION,
                codes::DUPLICATE_FIELD
            ]
        );
    }

    #[test]
    fn test_duplicates_and_undefined_types() {
        let err = SchemaBuilder::from_sdl(
            "type Query { a: Int a: Int b: Missing }
             type Query { c: Int }
             type String { d: Int }",
        )
        .unwrap_err();
        let found: Vec<_> = err.diagnostics().errors().map(|d| d.code).collect();
        assert_eq!(
            found,
            vec![
                codes::DUPLICATE_FIELD,
                codes::DUPLICATE_TYPE,
                codes::DUPLICATE_TYPE,
                codes::UNDEFINED_TYPE
            ]
        );
    }

    #[test]
    fn test_syntax_error() {
        let err = SchemaBuilder::from_sdl("type Query {").unwrap_err();
        assert!(matches!(err, SchemaError::Syntax(_)));
        insta::assert_snapshot!(err.to_string(), @"schema has 1 syntax error(s)");
    }

    #[test]
    fn test_programmatic_builder() {
        let schema = SchemaBuilder::new()
            .add_type(TypeDef::Object(ObjectDef {
                name: "Root".to_string(),
                description: None,
                fields: IndexMap::new(),
                implements: Vec::new(),
                directives: vec![AppliedDirective::new("cost").with_argument("complexity", json!(2))],
            }))
            .query_type("Root")
            .build()
            .unwrap();
        assert_eq!(schema.root_type(OperationType::Query), Some("Root"));
        assert_eq!(schema.get_type("Root").unwrap().kind(), TypeKind::Object);
    }
}
