//! Lexer for GraphQL source text.

use crate::token::{Token, TokenKind};
use gqlcost_core::Span;

/// The kind of a lexical error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedString,
    InvalidCharacter,
    InvalidNumber,
}

/// A lexical error attached to the last [`TokenKind::Error`] token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// A lexer for GraphQL source code.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: u32,
    error: Option<LexError>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            error: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Returns the text covered by a span.
    #[inline]
    #[must_use]
    pub fn span_text(&self, span: Span) -> &'a str {
        span.text(self.source)
    }

    /// Takes the error recorded for the last error token.
    pub fn take_error(&mut self) -> Option<LexError> {
        self.error.take()
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    #[inline]
    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn advance_by(&mut self, n: u32) {
        self.pos += n;
    }

    #[inline]
    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos as usize..]
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;
        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::empty(start));
        };

        let kind = match c {
            b'!' => self.single(TokenKind::Bang),
            b'$' => self.single(TokenKind::Dollar),
            b'&' => self.single(TokenKind::Amp),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b':' => self.single(TokenKind::Colon),
            b'=' => self.single(TokenKind::Eq),
            b'@' => self.single(TokenKind::At),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'|' => self.single(TokenKind::Pipe),
            b'.' => {
                if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.advance_by(3);
                    TokenKind::Spread
                } else {
                    self.advance();
                    self.fail(LexErrorKind::InvalidCharacter, start)
                }
            }
            b'"' => self.scan_string(start),
            b'-' | b'0'..=b'9' => self.scan_number(start),
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => self.scan_name(start),
            _ => {
                let width = self.source[start as usize..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.advance_by(width as u32);
                self.fail(LexErrorKind::InvalidCharacter, start)
            }
        };

        Token::new(kind, Span::new(start, self.pos))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn fail(&mut self, kind: LexErrorKind, start: u32) -> TokenKind {
        self.error = Some(LexError {
            kind,
            span: Span::new(start, self.pos),
        });
        TokenKind::Error
    }

    /// Skips whitespace, commas, byte order marks and comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\n' | b'\r' | b',' => self.advance(),
                0xEF if self.peek_at(1) == Some(0xBB) && self.peek_at(2) == Some(0xBF) => {
                    self.advance_by(3);
                }
                b'#' => match memchr::memchr2(b'\n', b'\r', self.rest()) {
                    Some(offset) => self.advance_by(offset as u32),
                    None => self.pos = self.bytes.len() as u32,
                },
                _ => break,
            }
        }
    }

    fn scan_name(&mut self, start: u32) -> TokenKind {
        while let Some(b'_' | b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9') = self.peek() {
            self.advance();
        }
        let text = &self.source[start as usize..self.pos as usize];
        TokenKind::from_keyword(text).unwrap_or(TokenKind::Name)
    }

    fn scan_digits(&mut self) -> u32 {
        let mut count = 0;
        while let Some(b'0'..=b'9') = self.peek() {
            self.advance();
            count += 1;
        }
        count
    }

    fn scan_number(&mut self, start: u32) -> TokenKind {
        if self.peek() == Some(b'-') {
            self.advance();
        }

        let int_start = self.pos;
        let digits = self.scan_digits();
        if digits == 0 || (digits > 1 && self.bytes[int_start as usize] == b'0') {
            return self.fail(LexErrorKind::InvalidNumber, start);
        }

        let mut is_float = false;
        if self.peek() == Some(b'.') {
            self.advance();
            if self.scan_digits() == 0 {
                return self.fail(LexErrorKind::InvalidNumber, start);
            }
            is_float = true;
        }
        if let Some(b'e' | b'E') = self.peek() {
            self.advance();
            if let Some(b'+' | b'-') = self.peek() {
                self.advance();
            }
            if self.scan_digits() == 0 {
                return self.fail(LexErrorKind::InvalidNumber, start);
            }
            is_float = true;
        }

        // A number may not be directly followed by a name start or a dot.
        if let Some(b'_' | b'a'..=b'z' | b'A'..=b'Z' | b'.') = self.peek() {
            self.advance();
            return self.fail(LexErrorKind::InvalidNumber, start);
        }

        if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn scan_string(&mut self, start: u32) -> TokenKind {
        if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') {
            return self.scan_block_string(start);
        }

        self.advance();
        while let Some(c) = self.peek() {
            match c {
                b'"' => {
                    self.advance();
                    return TokenKind::StringLiteral;
                }
                b'\\' => self.advance_by(2),
                b'\n' | b'\r' => break,
                _ => self.advance(),
            }
        }
        self.pos = self.pos.min(self.bytes.len() as u32);
        self.fail(LexErrorKind::UnterminatedString, start)
    }

    fn scan_block_string(&mut self, start: u32) -> TokenKind {
        self.advance_by(3);
        let finder = memchr::memmem::Finder::new(b"\"\"\"");
        loop {
            let Some(offset) = finder.find(self.rest()) else {
                self.pos = self.bytes.len() as u32;
                return self.fail(LexErrorKind::UnterminatedString, start);
            };
            let at = self.pos as usize + offset;
            self.advance_by(offset as u32 + 3);
            // `\"""` is an escaped delimiter inside the block.
            if at == 0 || self.bytes[at - 1] != b'\\' {
                return TokenKind::BlockStringLiteral;
            }
        }
    }
}

/// Decodes a quoted string token (including its quotes) into its value.
/// Returns `None` for an invalid escape sequence.
#[must_use]
pub fn string_value(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let code = read_hex4(&mut chars)?;
                if (0xD800..0xDC00).contains(&code) {
                    if chars.next()? != '\\' || chars.next()? != 'u' {
                        return None;
                    }
                    let low = read_hex4(&mut chars)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return None;
                    }
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    out.push(char::from_u32(combined)?);
                } else {
                    out.push(char::from_u32(code)?);
                }
            }
            _ => return None,
        }
    }
    Some(out)
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let mut code = 0;
    for _ in 0..4 {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

/// Decodes a block string token (including its triple quotes) into its value,
/// removing common indentation and blank leading/trailing lines.
#[must_use]
pub fn block_string_value(raw: &str) -> String {
    let inner = raw
        .strip_prefix("\"\"\"")
        .and_then(|s| s.strip_suffix("\"\"\""))
        .unwrap_or(raw)
        .replace("\\\"\"\"", "\"\"\"");

    let lines: Vec<&str> = inner.split("\r\n").flat_map(|l| l.split(['\n', '\r'])).collect();
    let is_blank = |line: &str| line.chars().all(|c| c == ' ' || c == '\t');
    let indent_of = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|line| !is_blank(line))
        .map(|line| indent_of(line))
        .min()
        .unwrap_or(0);

    let mut out: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                *line
            } else {
                line.get(common_indent..).unwrap_or("")
            }
        })
        .collect();

    while out.first().is_some_and(|l| is_blank(l)) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| is_blank(l)) {
        out.pop();
    }
    out.join("\n")
}
