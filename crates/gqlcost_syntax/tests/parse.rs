//! Integration tests for parsing executable documents.

use gqlcost_core::{diagnostics::codes, LineIndex};
use gqlcost_syntax::{parse, Definition, OperationType, Selection, Value};

const DOCUMENT: &str = r#"
# Books with their authors
query Books($limit: Int = 10) {
  list: books(limit: $limit) {
    ...BookF
  }
}

fragment BookF on Book {
  __typename
  title
  ... on Book { authors { ...AuthorF } }
}

fragment AuthorF on Author { id name }
"#;

/// Test a document mixing operations and fragments.
#[test]
fn test_parse_document_with_fragments() {
    let result = parse(DOCUMENT);
    assert!(!result.has_errors(), "{:?}", result.diagnostics);

    let doc = &result.document;
    assert_eq!(doc.definitions.len(), 3);
    assert!(matches!(doc.definitions[0], Definition::Operation(_)));

    let op = doc.operation(None).unwrap();
    assert_eq!(op.operation, OperationType::Query);
    assert_eq!(op.variable("limit").unwrap().default_value, Some(Value::Int(10)));

    let Selection::Field(books) = &op.selection_set.selections[0] else {
        panic!("expected field");
    };
    assert_eq!(books.response_key(), "list");
    assert_eq!(books.name.value, "books");
    assert!(matches!(
        books.argument("limit").map(|a| &a.value),
        Some(Value::Variable(name)) if name.value == "limit"
    ));

    let fragments: Vec<_> = doc.fragments().map(|f| f.name.value).collect();
    assert_eq!(fragments, vec!["BookF", "AuthorF"]);
    assert_eq!(doc.fragment("AuthorF").unwrap().type_condition.value, "Author");
    assert!(doc.fragment("Missing").is_none());
}

/// Test the reserved prefix of meta fields.
#[test]
fn test_meta_fields_are_reserved() {
    let result = parse(DOCUMENT);
    let fragment = result.document.fragment("BookF").unwrap();
    let reserved: Vec<_> = fragment
        .selection_set
        .selections
        .iter()
        .filter_map(|s| match s {
            Selection::Field(f) => Some((f.name.value, f.name.is_reserved())),
            _ => None,
        })
        .collect();
    assert_eq!(reserved, vec![("__typename", true), ("title", false)]);
}

#[test]
fn test_operation_lookup_by_name() {
    let result = parse("query A { a } query B { b } { c }");
    let doc = &result.document;
    assert_eq!(doc.operations().count(), 3);
    assert!(doc.operation(None).is_none());
    assert_eq!(doc.operation(Some("B")).unwrap().name.unwrap().value, "B");
    assert!(doc.operation(Some("C")).is_none());
}

#[test]
fn test_diagnostic_position() {
    let source = "query {\n  books(limit: )\n}";
    let result = parse(source);
    assert!(result.has_errors());

    let diagnostic = result.diagnostics.errors().next().unwrap();
    assert_eq!(diagnostic.code, codes::UNEXPECTED_TOKEN);
    assert_eq!(diagnostic.to_string(), "error[E0001]: unexpected token");
    assert_eq!(diagnostic.labels[0].message, "expected a value, found `)`");

    let index = LineIndex::new(source);
    let position = index.line_col(diagnostic.primary_span().unwrap().start);
    assert_eq!(position.to_string(), "2:16");
}
