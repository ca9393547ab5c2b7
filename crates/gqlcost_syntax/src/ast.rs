//! Abstract syntax tree for GraphQL documents.
//!
//! Names borrow from the source text; string values are decoded and owned.

use crate::token::DirectiveLocation;
use gqlcost_core::Span;

/// A complete document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<'a> {
    pub definitions: Vec<Definition<'a>>,
    pub span: Span,
}

impl<'a> Document<'a> {
    /// Returns the operation definitions in document order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition<'a>> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            _ => None,
        })
    }

    /// Returns the fragment definitions in document order.
    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition<'a>> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Fragment(frag) => Some(frag),
            _ => None,
        })
    }

    /// Finds a fragment definition by name.
    #[must_use]
    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition<'a>> {
        self.fragments().find(|f| f.name.value == name)
    }

    /// Selects an operation the way a request does: by name when one is given,
    /// otherwise the only operation of the document.
    #[must_use]
    pub fn operation(&self, name: Option<&str>) -> Option<&OperationDefinition<'a>> {
        match name {
            Some(name) => self
                .operations()
                .find(|op| op.name.is_some_and(|n| n.value == name)),
            None => {
                let mut ops = self.operations();
                let first = ops.next()?;
                ops.next().is_none().then_some(first)
            }
        }
    }
}

/// A top-level definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition<'a> {
    Operation(OperationDefinition<'a>),
    Fragment(FragmentDefinition<'a>),
    Schema(SchemaDefinition<'a>),
    Type(TypeDefinition<'a>),
    Directive(DirectiveDefinition<'a>),
    SchemaExtension(SchemaDefinition<'a>),
    TypeExtension(TypeDefinition<'a>),
}

impl Definition<'_> {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Operation(d) => d.span,
            Self::Fragment(d) => d.span,
            Self::Schema(d) | Self::SchemaExtension(d) => d.span,
            Self::Type(d) | Self::TypeExtension(d) => d.span(),
            Self::Directive(d) => d.span,
        }
    }
}

/// A name with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Name<'a> {
    pub value: &'a str,
    pub span: Span,
}

impl Name<'_> {
    /// Returns true for names reserved for introspection (`__typename`, `__schema`, ...).
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.value.starts_with("__")
    }
}

/// Type of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

// =============================================================================
// Executable definitions
// =============================================================================

/// An operation. The shorthand `{ ... }` form is a nameless query.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDefinition<'a> {
    pub operation: OperationType,
    pub name: Option<Name<'a>>,
    pub variable_definitions: Vec<VariableDefinition<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub selection_set: SelectionSet<'a>,
    pub span: Span,
}

impl<'a> OperationDefinition<'a> {
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&VariableDefinition<'a>> {
        self.variable_definitions
            .iter()
            .find(|var| var.name.value == name)
    }
}

/// `$name: Type = default`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition<'a> {
    pub name: Name<'a>,
    pub ty: Type<'a>,
    pub default_value: Option<Value<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDefinition<'a> {
    pub name: Name<'a>,
    pub type_condition: Name<'a>,
    pub directives: Vec<Directive<'a>>,
    pub selection_set: SelectionSet<'a>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet<'a> {
    pub selections: Vec<Selection<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'a> {
    Field(Field<'a>),
    FragmentSpread(FragmentSpread<'a>),
    InlineFragment(InlineFragment<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field<'a> {
    pub alias: Option<Name<'a>>,
    pub name: Name<'a>,
    pub arguments: Vec<Argument<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub selection_set: Option<SelectionSet<'a>>,
    pub span: Span,
}

impl<'a> Field<'a> {
    /// Returns the response key: the alias if present, otherwise the name.
    #[must_use]
    pub fn response_key(&self) -> &'a str {
        self.alias.unwrap_or(self.name).value
    }

    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Argument<'a>> {
        self.arguments.iter().find(|arg| arg.name.value == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument<'a> {
    pub name: Name<'a>,
    pub value: Value<'a>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread<'a> {
    pub name: Name<'a>,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment<'a> {
    pub type_condition: Option<Name<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub selection_set: SelectionSet<'a>,
    pub span: Span,
}

/// An applied directive, `@name(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive<'a> {
    pub name: Name<'a>,
    pub arguments: Vec<Argument<'a>>,
    pub span: Span,
}

impl<'a> Directive<'a> {
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Value<'a>> {
        self.arguments
            .iter()
            .find(|arg| arg.name.value == name)
            .map(|arg| &arg.value)
    }
}

// =============================================================================
// Values and types
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Variable(Name<'a>),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(&'a str),
    List(Vec<Value<'a>>),
    Object(Vec<(Name<'a>, Value<'a>)>),
}

/// A type reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Type<'a> {
    Named(Name<'a>),
    List(Box<Type<'a>>, Span),
    NonNull(Box<Type<'a>>, Span),
}

impl<'a> Type<'a> {
    /// Returns the innermost named type.
    #[must_use]
    pub fn named_type(&self) -> Name<'a> {
        match self {
            Self::Named(name) => *name,
            Self::List(inner, _) | Self::NonNull(inner, _) => inner.named_type(),
        }
    }

    /// Returns true if the type is a list, ignoring an outer non-null wrapper.
    #[must_use]
    pub fn is_list(&self) -> bool {
        match self {
            Self::Named(_) => false,
            Self::List(..) => true,
            Self::NonNull(inner, _) => inner.is_list(),
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Named(name) => name.span,
            Self::List(_, span) | Self::NonNull(_, span) => *span,
        }
    }
}

impl std::fmt::Display for Type<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name.value),
            Self::List(inner, _) => write!(f, "[{inner}]"),
            Self::NonNull(inner, _) => write!(f, "{inner}!"),
        }
    }
}

// =============================================================================
// Type system definitions
// =============================================================================

/// `schema { query: Query }`, also used for `extend schema`.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition<'a> {
    pub description: Option<String>,
    pub directives: Vec<Directive<'a>>,
    pub operations: Vec<RootOperationType<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RootOperationType<'a> {
    pub operation: OperationType,
    pub named_type: Name<'a>,
    pub span: Span,
}

/// Type definitions. Extensions reuse the same shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefinition<'a> {
    Scalar(ScalarTypeDefinition<'a>),
    Object(ObjectTypeDefinition<'a>),
    Interface(InterfaceTypeDefinition<'a>),
    Union(UnionTypeDefinition<'a>),
    Enum(EnumTypeDefinition<'a>),
    InputObject(InputObjectTypeDefinition<'a>),
}

impl<'a> TypeDefinition<'a> {
    #[must_use]
    pub fn name(&self) -> Name<'a> {
        match self {
            Self::Scalar(d) => d.name,
            Self::Object(d) => d.name,
            Self::Interface(d) => d.name,
            Self::Union(d) => d.name,
            Self::Enum(d) => d.name,
            Self::InputObject(d) => d.name,
        }
    }

    #[must_use]
    pub fn directives(&self) -> &[Directive<'a>] {
        match self {
            Self::Scalar(d) => &d.directives,
            Self::Object(d) => &d.directives,
            Self::Interface(d) => &d.directives,
            Self::Union(d) => &d.directives,
            Self::Enum(d) => &d.directives,
            Self::InputObject(d) => &d.directives,
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Scalar(d) => d.span,
            Self::Object(d) => d.span,
            Self::Interface(d) => d.span,
            Self::Union(d) => d.span,
            Self::Enum(d) => d.span,
            Self::InputObject(d) => d.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarTypeDefinition<'a> {
    pub description: Option<String>,
    pub name: Name<'a>,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTypeDefinition<'a> {
    pub description: Option<String>,
    pub name: Name<'a>,
    pub implements: Vec<Name<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub fields: Vec<FieldDefinition<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceTypeDefinition<'a> {
    pub description: Option<String>,
    pub name: Name<'a>,
    pub implements: Vec<Name<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub fields: Vec<FieldDefinition<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionTypeDefinition<'a> {
    pub description: Option<String>,
    pub name: Name<'a>,
    pub directives: Vec<Directive<'a>>,
    pub members: Vec<Name<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumTypeDefinition<'a> {
    pub description: Option<String>,
    pub name: Name<'a>,
    pub directives: Vec<Directive<'a>>,
    pub values: Vec<EnumValueDefinition<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDefinition<'a> {
    pub description: Option<String>,
    pub name: Name<'a>,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputObjectTypeDefinition<'a> {
    pub description: Option<String>,
    pub name: Name<'a>,
    pub directives: Vec<Directive<'a>>,
    pub fields: Vec<InputValueDefinition<'a>>,
    pub span: Span,
}

/// A field of an object or interface type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition<'a> {
    pub description: Option<String>,
    pub name: Name<'a>,
    pub arguments: Vec<InputValueDefinition<'a>>,
    pub ty: Type<'a>,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

/// An argument or input field definition.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDefinition<'a> {
    pub description: Option<String>,
    pub name: Name<'a>,
    pub ty: Type<'a>,
    pub default_value: Option<Value<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

/// `directive @name(args) repeatable on LOCATION | LOCATION`
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDefinition<'a> {
    pub description: Option<String>,
    pub name: Name<'a>,
    pub arguments: Vec<InputValueDefinition<'a>>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
    pub span: Span,
}
