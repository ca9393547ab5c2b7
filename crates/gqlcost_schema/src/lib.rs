//! Schema model for gqlcost.
//!
//! Builds a [`Schema`] from GraphQL SDL, keeping the directives applied to
//! types and fields so cost annotations can be read back, and indexes which
//! object types implement each interface.
//!
//! ```
//! use gqlcost_schema::SchemaBuilder;
//!
//! let schema = SchemaBuilder::from_sdl(
//!     "interface Press { title: String }
//!      type Book implements Press { title: String }
//!      type Query { press: [Press] }",
//! )
//! .unwrap();
//!
//! assert_eq!(schema.implementers("Press"), ["Book"]);
//! ```

pub mod builder;
pub mod error;
pub mod extensions;
pub mod schema;
pub mod value;

pub use builder::SchemaBuilder;
pub use error::SchemaError;
pub use extensions::Extensions;
pub use schema::{
    AppliedDirective, DirectiveDefinition, EnumDef, FieldDef, InputObjectDef, InputValueDef,
    InterfaceDef, ObjectDef, ScalarDef, Schema, TypeDef, TypeKind, TypeRef, UnionDef,
};
pub use value::const_value_to_json;
