//! Recursive descent parser for GraphQL documents.
//!
//! The parser never aborts: problems are recorded in a [`DiagnosticBag`] and
//! parsing resumes at the next definition.

use crate::ast::*;
use crate::lexer::{block_string_value, string_value, LexErrorKind, Lexer};
use crate::token::{DirectiveLocation, Token, TokenKind};
use gqlcost_core::{diagnostics::codes, DiagnosticBag, Span};

/// Default limit on nested selection sets, lists, objects and list types.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parser for GraphQL documents.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    prev_end: u32,
    diagnostics: DiagnosticBag,
    depth: usize,
    max_depth: usize,
}

/// Result of parsing.
#[derive(Debug)]
pub struct ParseResult<'a> {
    pub document: Document<'a>,
    pub diagnostics: DiagnosticBag,
}

impl ParseResult<'_> {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Parses a source string into a document.
#[must_use]
pub fn parse(source: &str) -> ParseResult<'_> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

/// Parses a source string, reporting nesting deeper than `max_depth`.
#[must_use]
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> ParseResult<'_> {
    let mut parser = Parser::new(source).with_max_depth(max_depth);
    let document = parser.parse_document();
    ParseResult {
        document,
        diagnostics: parser.diagnostics,
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(source),
            current: Token::new(TokenKind::Eof, Span::empty(0)),
            prev_end: 0,
            diagnostics: DiagnosticBag::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        };
        parser.current = parser.next_significant_token();
        parser
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn advance(&mut self) {
        self.prev_end = self.current.span.end;
        self.current = self.next_significant_token();
    }

    /// Pulls tokens from the lexer, reporting and skipping error tokens.
    fn next_significant_token(&mut self) -> Token {
        loop {
            let token = self.lexer.next_token();
            if token.kind != TokenKind::Error {
                return token;
            }
            if let Some(error) = self.lexer.take_error() {
                let (code, title) = match error.kind {
                    LexErrorKind::UnterminatedString => {
                        (codes::UNTERMINATED_STRING, "unterminated string")
                    }
                    LexErrorKind::InvalidCharacter => (codes::INVALID_CHARACTER, "invalid character"),
                    LexErrorKind::InvalidNumber => (codes::INVALID_NUMBER, "invalid number"),
                };
                self.diagnostics
                    .error(code, title, error.span, self.lexer.span_text(error.span));
            }
        }
    }

    /// Consumes the current token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects a specific token kind.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error_expected(kind.as_str());
            false
        }
    }

    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    /// Reports an error at the current token.
    fn error(&mut self, message: &str) {
        self.diagnostics.error(
            codes::INVALID_SYNTAX,
            message,
            self.current.span,
            message.to_string(),
        );
    }

    /// Enters one nesting level, reporting an error at the limit.
    fn enter_nested(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.diagnostics.error(
                codes::NESTING_TOO_DEEP,
                "nesting too deep",
                self.current.span,
                format!("nesting exceeds the maximum depth of {}", self.max_depth),
            );
            return false;
        }
        self.depth += 1;
        true
    }

    /// Skips a bracketed group starting at the current `open` token.
    fn skip_group(&mut self, open: TokenKind, close: TokenKind) {
        let mut depth = 0usize;
        loop {
            match self.at() {
                TokenKind::Eof => return,
                kind if kind == open => depth += 1,
                kind if kind == close => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn error_expected(&mut self, expected: &str) {
        let (code, title) = if self.at_kind(TokenKind::Eof) {
            (codes::UNEXPECTED_EOF, "unexpected end of input")
        } else {
            (codes::UNEXPECTED_TOKEN, "unexpected token")
        };
        let found = match self.at() {
            kind @ (TokenKind::Eof | TokenKind::StringLiteral | TokenKind::BlockStringLiteral) => {
                kind.as_str().to_string()
            }
            _ => format!("`{}`", self.current_text()),
        };
        self.diagnostics.error(
            code,
            title,
            self.current.span,
            format!("expected {expected}, found {found}"),
        );
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> Document<'a> {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        while !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            let errors_before = self.diagnostics.error_count();

            if let Some(def) = self.parse_definition() {
                definitions.push(def);
            }

            if self.diagnostics.error_count() > errors_before || self.current.span.start == before
            {
                self.recover(before);
            }
        }

        Document {
            definitions,
            span: Span::new(start, self.current.span.end),
        }
    }

    /// Skips to the next token that can start a definition, always making progress.
    fn recover(&mut self, before: u32) {
        if self.current.span.start == before && !self.at_kind(TokenKind::Eof) {
            self.advance();
        }
        while !self.at_kind(TokenKind::Eof) && !self.at_definition_start() {
            self.advance();
        }
    }

    fn at_definition_start(&self) -> bool {
        matches!(
            self.at(),
            TokenKind::Query
                | TokenKind::Mutation
                | TokenKind::Subscription
                | TokenKind::Fragment
                | TokenKind::Schema
                | TokenKind::Scalar
                | TokenKind::Type
                | TokenKind::Interface
                | TokenKind::Union
                | TokenKind::Enum
                | TokenKind::Input
                | TokenKind::Directive
                | TokenKind::Extend
        )
    }

    fn parse_definition(&mut self) -> Option<Definition<'a>> {
        let start = self.current.span.start;
        let description = self.parse_description();

        match self.at() {
            TokenKind::LBrace
            | TokenKind::Query
            | TokenKind::Mutation
            | TokenKind::Subscription => Some(Definition::Operation(self.parse_operation())),
            TokenKind::Fragment => self.parse_fragment_definition().map(Definition::Fragment),
            TokenKind::Schema => Some(Definition::Schema(
                self.parse_schema_definition(description, start),
            )),
            TokenKind::Scalar
            | TokenKind::Type
            | TokenKind::Interface
            | TokenKind::Union
            | TokenKind::Enum
            | TokenKind::Input => self
                .parse_type_definition(description, start)
                .map(Definition::Type),
            TokenKind::Directive => self
                .parse_directive_definition(description, start)
                .map(Definition::Directive),
            TokenKind::Extend => {
                self.advance();
                match self.at() {
                    TokenKind::Schema => Some(Definition::SchemaExtension(
                        self.parse_schema_definition(None, start),
                    )),
                    TokenKind::Scalar
                    | TokenKind::Type
                    | TokenKind::Interface
                    | TokenKind::Union
                    | TokenKind::Enum
                    | TokenKind::Input => self
                        .parse_type_definition(None, start)
                        .map(Definition::TypeExtension),
                    _ => {
                        self.error_expected("a type system definition after `extend`");
                        None
                    }
                }
            }
            _ => {
                self.error_expected("a definition");
                None
            }
        }
    }

    fn parse_description(&mut self) -> Option<String> {
        let value = match self.at() {
            TokenKind::StringLiteral => self.parse_string_value(),
            TokenKind::BlockStringLiteral => block_string_value(self.current_text()),
            _ => return None,
        };
        self.advance();
        Some(value)
    }

    /// Decodes the current string token, reporting invalid escapes.
    fn parse_string_value(&mut self) -> String {
        match string_value(self.current_text()) {
            Some(value) => value,
            None => {
                self.error("invalid escape sequence in string");
                String::new()
            }
        }
    }

    /// Parses a name. Keywords are accepted as names.
    fn parse_name(&mut self) -> Option<Name<'a>> {
        if self.at().is_name() {
            let name = Name {
                value: self.current_text(),
                span: self.current.span,
            };
            self.advance();
            Some(name)
        } else {
            self.error_expected("a name");
            None
        }
    }

    // =========================================================================
    // Executable definitions
    // =========================================================================

    fn parse_operation(&mut self) -> OperationDefinition<'a> {
        let start = self.current.span.start;

        if self.at_kind(TokenKind::LBrace) {
            let selection_set = self.parse_selection_set();
            return OperationDefinition {
                operation: OperationType::Query,
                name: None,
                variable_definitions: Vec::new(),
                directives: Vec::new(),
                selection_set,
                span: self.span_from(start),
            };
        }

        let operation = match self.at() {
            TokenKind::Mutation => OperationType::Mutation,
            TokenKind::Subscription => OperationType::Subscription,
            _ => OperationType::Query,
        };
        self.advance();

        let name = if self.at().is_name() {
            self.parse_name()
        } else {
            None
        };
        let variable_definitions = self.parse_variable_definitions();
        let directives = self.parse_directives(false);
        let selection_set = self.parse_selection_set();

        OperationDefinition {
            operation,
            name,
            variable_definitions,
            directives,
            selection_set,
            span: self.span_from(start),
        }
    }

    fn parse_variable_definitions(&mut self) -> Vec<VariableDefinition<'a>> {
        let mut definitions = Vec::new();
        if !self.eat(TokenKind::LParen) {
            return definitions;
        }

        while self.at_kind(TokenKind::Dollar) {
            match self.parse_variable_definition() {
                Some(def) => definitions.push(def),
                None => break,
            }
        }
        self.expect(TokenKind::RParen);
        definitions
    }

    fn parse_variable_definition(&mut self) -> Option<VariableDefinition<'a>> {
        let start = self.current.span.start;
        self.advance();
        let name = self.parse_name()?;
        if !self.expect(TokenKind::Colon) {
            return None;
        }
        let ty = self.parse_type()?;
        let default_value = if self.eat(TokenKind::Eq) {
            self.parse_value(true)
        } else {
            None
        };
        let directives = self.parse_directives(true);

        Some(VariableDefinition {
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        })
    }

    fn parse_fragment_definition(&mut self) -> Option<FragmentDefinition<'a>> {
        let start = self.current.span.start;
        self.advance();

        let name = self.parse_name()?;
        if !self.expect(TokenKind::On) {
            return None;
        }
        let type_condition = self.parse_name()?;
        let directives = self.parse_directives(false);
        let selection_set = self.parse_selection_set();

        Some(FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_selection_set(&mut self) -> SelectionSet<'a> {
        let start = self.current.span.start;
        let mut selections = Vec::new();

        if self.at_kind(TokenKind::LBrace) && !self.enter_nested() {
            self.skip_group(TokenKind::LBrace, TokenKind::RBrace);
        } else if self.expect(TokenKind::LBrace) {
            while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
                match self.parse_selection() {
                    Some(selection) => selections.push(selection),
                    None => break,
                }
            }
            self.expect(TokenKind::RBrace);
            self.depth -= 1;
        }

        SelectionSet {
            selections,
            span: self.span_from(start),
        }
    }

    /// Returns `None` without consuming anything when no selection starts here.
    fn parse_selection(&mut self) -> Option<Selection<'a>> {
        if self.at_kind(TokenKind::Spread) {
            return Some(self.parse_fragment(self.current.span.start));
        }
        if self.at().is_name() {
            return self.parse_field().map(Selection::Field);
        }
        None
    }

    fn parse_fragment(&mut self, start: u32) -> Selection<'a> {
        self.advance();

        if self.at().is_name() && !self.at_kind(TokenKind::On) {
            let name = Name {
                value: self.current_text(),
                span: self.current.span,
            };
            self.advance();
            let directives = self.parse_directives(false);
            return Selection::FragmentSpread(FragmentSpread {
                name,
                directives,
                span: self.span_from(start),
            });
        }

        let type_condition = if self.eat(TokenKind::On) {
            self.parse_name()
        } else {
            None
        };
        let directives = self.parse_directives(false);
        let selection_set = self.parse_selection_set();

        Selection::InlineFragment(InlineFragment {
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_field(&mut self) -> Option<Field<'a>> {
        let start = self.current.span.start;
        let first = self.parse_name()?;

        let (alias, name) = if self.eat(TokenKind::Colon) {
            (Some(first), self.parse_name()?)
        } else {
            (None, first)
        };

        let arguments = self.parse_arguments(false);
        let directives = self.parse_directives(false);
        let selection_set = if self.at_kind(TokenKind::LBrace) {
            Some(self.parse_selection_set())
        } else {
            None
        };

        Some(Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_arguments(&mut self, is_const: bool) -> Vec<Argument<'a>> {
        let mut arguments = Vec::new();
        if !self.eat(TokenKind::LParen) {
            return arguments;
        }

        while self.at().is_name() {
            let start = self.current.span.start;
            let Some(name) = self.parse_name() else { break };
            if !self.expect(TokenKind::Colon) {
                break;
            }
            let Some(value) = self.parse_value(is_const) else {
                break;
            };
            arguments.push(Argument {
                name,
                value,
                span: self.span_from(start),
            });
        }
        self.expect(TokenKind::RParen);
        arguments
    }

    fn parse_directives(&mut self, is_const: bool) -> Vec<Directive<'a>> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) {
            let start = self.current.span.start;
            self.advance();
            let Some(name) = self.parse_name() else { break };
            let arguments = self.parse_arguments(is_const);
            directives.push(Directive {
                name,
                arguments,
                span: self.span_from(start),
            });
        }
        directives
    }

    // =========================================================================
    // Values and types
    // =========================================================================

    fn parse_value(&mut self, is_const: bool) -> Option<Value<'a>> {
        let value = match self.at() {
            TokenKind::Dollar => {
                if is_const {
                    self.error("variables are not allowed in constant values");
                }
                self.advance();
                return self.parse_name().map(Value::Variable);
            }
            TokenKind::IntLiteral => match self.current_text().parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => {
                    self.diagnostics.error(
                        codes::INVALID_NUMBER,
                        "integer out of range",
                        self.current.span,
                        self.current_text(),
                    );
                    Value::Null
                }
            },
            TokenKind::FloatLiteral => {
                Value::Float(self.current_text().parse::<f64>().unwrap_or_default())
            }
            TokenKind::StringLiteral => Value::String(self.parse_string_value()),
            TokenKind::BlockStringLiteral => {
                Value::String(block_string_value(self.current_text()))
            }
            TokenKind::True => Value::Boolean(true),
            TokenKind::False => Value::Boolean(false),
            TokenKind::Null => Value::Null,
            TokenKind::LBracket => return Some(self.parse_list_value(is_const)),
            TokenKind::LBrace => return Some(self.parse_object_value(is_const)),
            kind if kind.is_name() => Value::Enum(self.current_text()),
            _ => {
                self.error_expected("a value");
                return None;
            }
        };
        self.advance();
        Some(value)
    }

    fn parse_list_value(&mut self, is_const: bool) -> Value<'a> {
        if !self.enter_nested() {
            self.skip_group(TokenKind::LBracket, TokenKind::RBracket);
            return Value::Null;
        }
        self.advance();
        let mut items = Vec::new();
        while !self.at_kind(TokenKind::RBracket) && !self.at_kind(TokenKind::Eof) {
            match self.parse_value(is_const) {
                Some(item) => items.push(item),
                None => break,
            }
        }
        self.expect(TokenKind::RBracket);
        self.depth -= 1;
        Value::List(items)
    }

    fn parse_object_value(&mut self, is_const: bool) -> Value<'a> {
        if !self.enter_nested() {
            self.skip_group(TokenKind::LBrace, TokenKind::RBrace);
            return Value::Null;
        }
        self.advance();
        let mut fields = Vec::new();
        while self.at().is_name() {
            let Some(name) = self.parse_name() else { break };
            if !self.expect(TokenKind::Colon) {
                break;
            }
            let Some(value) = self.parse_value(is_const) else {
                break;
            };
            fields.push((name, value));
        }
        self.expect(TokenKind::RBrace);
        self.depth -= 1;
        Value::Object(fields)
    }

    fn parse_type(&mut self) -> Option<Type<'a>> {
        let start = self.current.span.start;
        let ty = if self.at_kind(TokenKind::LBracket) {
            if !self.enter_nested() {
                return None;
            }
            self.advance();
            let inner = self.parse_type();
            self.depth -= 1;
            let inner = inner?;
            if !self.expect(TokenKind::RBracket) {
                return None;
            }
            Type::List(Box::new(inner), self.span_from(start))
        } else {
            Type::Named(self.parse_name()?)
        };

        if self.eat(TokenKind::Bang) {
            Some(Type::NonNull(Box::new(ty), self.span_from(start)))
        } else {
            Some(ty)
        }
    }

    // =========================================================================
    // Type system definitions
    // =========================================================================

    fn parse_schema_definition(
        &mut self,
        description: Option<String>,
        start: u32,
    ) -> SchemaDefinition<'a> {
        self.advance();
        let directives = self.parse_directives(true);
        let mut operations = Vec::new();

        if self.eat(TokenKind::LBrace) {
            loop {
                let op_start = self.current.span.start;
                let operation = match self.at() {
                    TokenKind::Query => OperationType::Query,
                    TokenKind::Mutation => OperationType::Mutation,
                    TokenKind::Subscription => OperationType::Subscription,
                    _ => break,
                };
                self.advance();
                if !self.expect(TokenKind::Colon) {
                    break;
                }
                let Some(named_type) = self.parse_name() else {
                    break;
                };
                operations.push(RootOperationType {
                    operation,
                    named_type,
                    span: self.span_from(op_start),
                });
            }
            self.expect(TokenKind::RBrace);
        }

        SchemaDefinition {
            description,
            directives,
            operations,
            span: self.span_from(start),
        }
    }

    fn parse_type_definition(
        &mut self,
        description: Option<String>,
        start: u32,
    ) -> Option<TypeDefinition<'a>> {
        let keyword = self.at();
        self.advance();
        let name = self.parse_name()?;

        let def = match keyword {
            TokenKind::Scalar => {
                let directives = self.parse_directives(true);
                TypeDefinition::Scalar(ScalarTypeDefinition {
                    description,
                    name,
                    directives,
                    span: self.span_from(start),
                })
            }
            TokenKind::Type => {
                let implements = self.parse_implements();
                let directives = self.parse_directives(true);
                let fields = self.parse_fields_definition();
                TypeDefinition::Object(ObjectTypeDefinition {
                    description,
                    name,
                    implements,
                    directives,
                    fields,
                    span: self.span_from(start),
                })
            }
            TokenKind::Interface => {
                let implements = self.parse_implements();
                let directives = self.parse_directives(true);
                let fields = self.parse_fields_definition();
                TypeDefinition::Interface(InterfaceTypeDefinition {
                    description,
                    name,
                    implements,
                    directives,
                    fields,
                    span: self.span_from(start),
                })
            }
            TokenKind::Union => {
                let directives = self.parse_directives(true);
                let mut members = Vec::new();
                if self.eat(TokenKind::Eq) {
                    self.eat(TokenKind::Pipe);
                    loop {
                        let Some(member) = self.parse_name() else { break };
                        members.push(member);
                        if !self.eat(TokenKind::Pipe) {
                            break;
                        }
                    }
                }
                TypeDefinition::Union(UnionTypeDefinition {
                    description,
                    name,
                    directives,
                    members,
                    span: self.span_from(start),
                })
            }
            TokenKind::Enum => {
                let directives = self.parse_directives(true);
                let values = self.parse_enum_values();
                TypeDefinition::Enum(EnumTypeDefinition {
                    description,
                    name,
                    directives,
                    values,
                    span: self.span_from(start),
                })
            }
            _ => {
                let directives = self.parse_directives(true);
                let fields = self.parse_input_fields(TokenKind::LBrace, TokenKind::RBrace);
                TypeDefinition::InputObject(InputObjectTypeDefinition {
                    description,
                    name,
                    directives,
                    fields,
                    span: self.span_from(start),
                })
            }
        };
        Some(def)
    }

    fn parse_implements(&mut self) -> Vec<Name<'a>> {
        let mut interfaces = Vec::new();
        if !self.eat(TokenKind::Implements) {
            return interfaces;
        }
        self.eat(TokenKind::Amp);
        loop {
            let Some(name) = self.parse_name() else { break };
            interfaces.push(name);
            if !self.eat(TokenKind::Amp) {
                break;
            }
        }
        interfaces
    }

    fn parse_fields_definition(&mut self) -> Vec<FieldDefinition<'a>> {
        let mut fields = Vec::new();
        if !self.eat(TokenKind::LBrace) {
            return fields;
        }

        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            match self.parse_field_definition() {
                Some(field) => fields.push(field),
                None => break,
            }
        }
        self.expect(TokenKind::RBrace);
        fields
    }

    fn parse_field_definition(&mut self) -> Option<FieldDefinition<'a>> {
        let start = self.current.span.start;
        let description = self.parse_description();
        if !self.at().is_name() {
            return None;
        }
        let name = self.parse_name()?;
        let arguments = self.parse_input_fields(TokenKind::LParen, TokenKind::RParen);
        if !self.expect(TokenKind::Colon) {
            return None;
        }
        let ty = self.parse_type()?;
        let directives = self.parse_directives(true);

        Some(FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
            span: self.span_from(start),
        })
    }

    /// Parses argument definitions `( ... )` or input fields `{ ... }`.
    fn parse_input_fields(
        &mut self,
        open: TokenKind,
        close: TokenKind,
    ) -> Vec<InputValueDefinition<'a>> {
        let mut values = Vec::new();
        if !self.eat(open) {
            return values;
        }

        while !self.at_kind(close) && !self.at_kind(TokenKind::Eof) {
            match self.parse_input_value_definition() {
                Some(value) => values.push(value),
                None => break,
            }
        }
        self.expect(close);
        values
    }

    fn parse_input_value_definition(&mut self) -> Option<InputValueDefinition<'a>> {
        let start = self.current.span.start;
        let description = self.parse_description();
        if !self.at().is_name() {
            return None;
        }
        let name = self.parse_name()?;
        if !self.expect(TokenKind::Colon) {
            return None;
        }
        let ty = self.parse_type()?;
        let default_value = if self.eat(TokenKind::Eq) {
            self.parse_value(true)
        } else {
            None
        };
        let directives = self.parse_directives(true);

        Some(InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        })
    }

    fn parse_enum_values(&mut self) -> Vec<EnumValueDefinition<'a>> {
        let mut values = Vec::new();
        if !self.eat(TokenKind::LBrace) {
            return values;
        }

        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            let start = self.current.span.start;
            let description = self.parse_description();
            if !self.at().is_name() {
                break;
            }
            let Some(name) = self.parse_name() else { break };
            let directives = self.parse_directives(true);
            values.push(EnumValueDefinition {
                description,
                name,
                directives,
                span: self.span_from(start),
            });
        }
        self.expect(TokenKind::RBrace);
        values
    }

    fn parse_directive_definition(
        &mut self,
        description: Option<String>,
        start: u32,
    ) -> Option<DirectiveDefinition<'a>> {
        self.advance();
        if !self.expect(TokenKind::At) {
            return None;
        }
        let name = self.parse_name()?;
        let arguments = self.parse_input_fields(TokenKind::LParen, TokenKind::RParen);
        let repeatable = self.eat(TokenKind::Repeatable);
        if !self.expect(TokenKind::On) {
            return None;
        }

        self.eat(TokenKind::Pipe);
        let mut locations = Vec::new();
        loop {
            let Some(location) = self.parse_name() else { break };
            match DirectiveLocation::from_name(location.value) {
                Some(loc) => locations.push(loc),
                None => self.diagnostics.error(
                    codes::INVALID_SYNTAX,
                    "unknown directive location",
                    location.span,
                    format!("`{}` is not a directive location", location.value),
                ),
            }
            if !self.eat(TokenKind::Pipe) {
                break;
            }
        }

        Some(DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
            span: self.span_from(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Document<'_> {
        let result = parse(source);
        assert!(
            !result.has_errors(),
            "unexpected diagnostics: {:?}",
            result.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>()
        );
        result.document
    }

    #[test]
    fn test_parse_shorthand_query() {
        let doc = parse_ok("{ books { id } }");
        let op = doc.operations().next().unwrap();
        assert_eq!(op.operation, OperationType::Query);
        assert!(op.name.is_none());
        let Selection::Field(books) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert_eq!(books.name.value, "books");
        assert_eq!(books.selection_set.as_ref().unwrap().selections.len(), 1);
    }

    #[test]
    fn test_parse_operation_with_variables() {
        let doc = parse_ok(
            "query Books($limit: Int = 10, $ids: [ID!]!) @live { a: books(limit: $limit) { id } }",
        );
        let op = doc.operations().next().unwrap();
        assert_eq!(op.name.unwrap().value, "Books");
        assert_eq!(op.directives[0].name.value, "live");

        let limit = op.variable("limit").unwrap();
        assert_eq!(limit.ty.to_string(), "Int");
        assert_eq!(limit.default_value, Some(Value::Int(10)));

        let ids = op.variable("ids").unwrap();
        assert_eq!(ids.ty.to_string(), "[ID!]!");
        assert!(ids.ty.is_list());
        assert_eq!(ids.ty.named_type().value, "ID");

        let Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert_eq!(field.response_key(), "a");
        assert_eq!(field.name.value, "books");
        assert!(matches!(
            field.argument("limit").map(|a| &a.value),
            Some(Value::Variable(name)) if name.value == "limit"
        ));
    }

    #[test]
    fn test_parse_fragments() {
        let doc = parse_ok(
            "{ ...Parts ... on Book { title } ... @skip(if: true) { id } }
             fragment Parts on Query { books { id } }",
        );
        let op = doc.operations().next().unwrap();
        let selections = &op.selection_set.selections;
        assert!(matches!(&selections[0], Selection::FragmentSpread(s) if s.name.value == "Parts"));
        assert!(matches!(
            &selections[1],
            Selection::InlineFragment(f) if f.type_condition.map(|n| n.value) == Some("Book")
        ));
        assert!(matches!(
            &selections[2],
            Selection::InlineFragment(f) if f.type_condition.is_none() && f.directives.len() == 1
        ));
        let fragment = doc.fragment("Parts").unwrap();
        assert_eq!(fragment.type_condition.value, "Query");
    }

    #[test]
    fn test_keywords_as_field_names() {
        let doc = parse_ok("{ type query(on: true) fragment { schema } }");
        let op = doc.operations().next().unwrap();
        let names: Vec<_> = op
            .selection_set
            .selections
            .iter()
            .map(|s| match s {
                Selection::Field(f) => f.name.value,
                _ => "",
            })
            .collect();
        assert_eq!(names, vec!["type", "query", "fragment"]);
    }

    #[test]
    fn test_parse_values() {
        let doc = parse_ok(
            r#"{ f(a: -3, b: 1.5, c: "x\ty", d: [1, 2], e: {k: RED}, g: null, h: """ block """) }"#,
        );
        let op = doc.operations().next().unwrap();
        let Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        let values: Vec<_> = field.arguments.iter().map(|a| a.value.clone()).collect();
        assert_eq!(values[0], Value::Int(-3));
        assert_eq!(values[1], Value::Float(1.5));
        assert_eq!(values[2], Value::String("x\ty".to_string()));
        assert_eq!(values[3], Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert!(matches!(&values[4], Value::Object(fields) if fields[0].1 == Value::Enum("RED")));
        assert_eq!(values[5], Value::Null);
        assert_eq!(values[6], Value::String(" block ".to_string()));
    }

    #[test]
    fn test_parse_type_system() {
        let doc = parse_ok(
            r#"
            "Cost of a field"
            directive @cost(complexity: Int) on FIELD_DEFINITION | OBJECT
            directive @listCost(assumedSize: Int, arguments: [String!]) repeatable on | FIELD_DEFINITION
            schema { query: Root mutation: Mut }
            scalar Date @specifiedBy(url: "https://example.com")
            interface Press { title: String! }
            type Book implements Press & Node @cost(complexity: 1) {
              """The title"""
              title(format: String = "plain"): String! @cost(complexity: 2)
            }
            union Search = | Book | Magazine
            enum Color { RED GREEN }
            input Filter { limit: Int = 10 }
            extend type Book { isbn: String }
            extend schema { subscription: Sub }
            "#,
        );

        let kinds: Vec<_> = doc
            .definitions
            .iter()
            .map(|d| match d {
                Definition::Directive(_) => "directive",
                Definition::Schema(_) => "schema",
                Definition::Type(TypeDefinition::Scalar(_)) => "scalar",
                Definition::Type(TypeDefinition::Interface(_)) => "interface",
                Definition::Type(TypeDefinition::Object(_)) => "object",
                Definition::Type(TypeDefinition::Union(_)) => "union",
                Definition::Type(TypeDefinition::Enum(_)) => "enum",
                Definition::Type(TypeDefinition::InputObject(_)) => "input",
                Definition::TypeExtension(_) => "extend type",
                Definition::SchemaExtension(_) => "extend schema",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "directive",
                "directive",
                "schema",
                "scalar",
                "interface",
                "object",
                "union",
                "enum",
                "input",
                "extend type",
                "extend schema"
            ]
        );

        let Definition::Directive(cost) = &doc.definitions[0] else {
            panic!("expected directive");
        };
        assert_eq!(cost.description.as_deref(), Some("Cost of a field"));
        assert_eq!(
            cost.locations,
            vec![DirectiveLocation::FieldDefinition, DirectiveLocation::Object]
        );
        let Definition::Directive(list_cost) = &doc.definitions[1] else {
            panic!("expected directive");
        };
        assert!(list_cost.repeatable);
        assert_eq!(list_cost.arguments[1].ty.to_string(), "[String!]");

        let Definition::Type(TypeDefinition::Object(book)) = &doc.definitions[5] else {
            panic!("expected object");
        };
        let implements: Vec<_> = book.implements.iter().map(|n| n.value).collect();
        assert_eq!(implements, vec!["Press", "Node"]);
        assert_eq!(book.fields[0].description.as_deref(), Some("The title"));
        assert_eq!(
            book.fields[0].arguments[0].default_value,
            Some(Value::String("plain".to_string()))
        );
        assert_eq!(
            book.fields[0].directives[0].argument("complexity"),
            Some(&Value::Int(2))
        );

        let Definition::Type(TypeDefinition::Union(search)) = &doc.definitions[6] else {
            panic!("expected union");
        };
        assert_eq!(search.members.len(), 2);
    }

    #[test]
    fn test_recovers_after_error() {
        let result = parse("{ books( } query Ok { ok }");
        assert!(result.has_errors());
        let names: Vec<_> = result
            .document
            .operations()
            .filter_map(|op| op.name.map(|n| n.value))
            .collect();
        assert_eq!(names, vec!["Ok"]);
    }

    #[test]
    fn test_unexpected_eof() {
        let result = parse("{ books {");
        let found: Vec<_> = result.diagnostics.errors().map(|d| d.code).collect();
        assert!(found.contains(&codes::UNEXPECTED_EOF));
    }

    #[test]
    fn test_variables_rejected_in_const_values() {
        let result = parse("query($a: Int = $b) { f }");
        assert!(result.has_errors());
    }

    #[test]
    fn test_integer_overflow_reported() {
        let result = parse("{ f(a: 99999999999999999999) }");
        let diag = result.diagnostics.errors().next().unwrap();
        assert_eq!(diag.code, codes::INVALID_NUMBER);
    }

    fn nested_fields(depth: usize) -> String {
        format!("{}{}", "{ next ".repeat(depth), "}".repeat(depth))
    }

    fn error_codes(result: &ParseResult<'_>) -> Vec<&'static str> {
        result.diagnostics.errors().map(|d| d.code).collect()
    }

    #[test]
    fn test_nesting_at_limit() {
        let source = nested_fields(8);
        assert!(!parse_with_max_depth(&source, 8).has_errors());
        let result = parse_with_max_depth(&source, 7);
        assert_eq!(error_codes(&result), vec![codes::NESTING_TOO_DEEP]);
    }

    #[test]
    fn test_deep_selections_are_rejected() {
        let source = format!("{} query Ok {{ ok }}", nested_fields(5000));
        let result = parse(&source);
        assert_eq!(error_codes(&result), vec![codes::NESTING_TOO_DEEP]);
        let names: Vec<_> = result
            .document
            .operations()
            .filter_map(|op| op.name.map(|n| n.value))
            .collect();
        assert_eq!(names, vec!["Ok"]);
    }

    #[test]
    fn test_deep_values_and_types_are_rejected() {
        let value = format!("{{ f(a: {}1{}) }}", "[".repeat(5000), "]".repeat(5000));
        assert!(error_codes(&parse(&value)).contains(&codes::NESTING_TOO_DEEP));

        let object = format!("{{ f(a: {}1{}) }}", "{ a: ".repeat(5000), "}".repeat(5000));
        assert!(error_codes(&parse(&object)).contains(&codes::NESTING_TOO_DEEP));

        let ty = format!("query($a: {}Int{}) {{ f }}", "[".repeat(5000), "]".repeat(5000));
        assert!(error_codes(&parse(&ty)).contains(&codes::NESTING_TOO_DEEP));
    }
}

