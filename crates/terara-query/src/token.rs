use std::fmt;

use serde::Serialize;

/// Kind of a lexical token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Eof,
    /// Never produced by [`Lexer`](crate::Lexer), which reports failures as
    /// [`LexError`](crate::LexError). Available to parsers that record
    /// errors inline.
    Error,

    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,

    Comma,
    Colon,
    Semicolon,
    Dot,
    DoubleColon,
    Pipe,

    Percent,
    Plus,
    Minus,
    Asterisk,
    Slash,
    DoubleSlash,
    DoubleAsterisk,

    Bang,
    And,
    Or,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,

    Inc,
    Dec,

    Number,
    Param,
    Ident,
    String,
    Bool,
    Null,
    Let,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Error => "Error",
            TokenKind::OpenParen => "OpenParen",
            TokenKind::CloseParen => "CloseParen",
            TokenKind::OpenBracket => "OpenBracket",
            TokenKind::CloseBracket => "CloseBracket",
            TokenKind::OpenBrace => "OpenBrace",
            TokenKind::CloseBrace => "CloseBrace",
            TokenKind::Comma => "Comma",
            TokenKind::Colon => "Colon",
            TokenKind::Semicolon => "Semicolon",
            TokenKind::Dot => "Dot",
            TokenKind::DoubleColon => "DoubleColon",
            TokenKind::Pipe => "Pipe",
            TokenKind::Percent => "Percent",
            TokenKind::Plus => "Plus",
            TokenKind::Minus => "Minus",
            TokenKind::Asterisk => "Asterisk",
            TokenKind::Slash => "Slash",
            TokenKind::DoubleSlash => "DoubleSlash",
            TokenKind::DoubleAsterisk => "DoubleAsterisk",
            TokenKind::Bang => "Bang",
            TokenKind::And => "And",
            TokenKind::Or => "Or",
            TokenKind::Equal => "Equal",
            TokenKind::NotEqual => "NotEqual",
            TokenKind::LessThan => "LessThan",
            TokenKind::LessThanEqual => "LessThanEqual",
            TokenKind::GreaterThan => "GreaterThan",
            TokenKind::GreaterThanEqual => "GreaterThanEqual",
            TokenKind::Inc => "Inc",
            TokenKind::Dec => "Dec",
            TokenKind::Number => "Number",
            TokenKind::Param => "Param",
            TokenKind::Ident => "Ident",
            TokenKind::String => "String",
            TokenKind::Bool => "Bool",
            TokenKind::Null => "Null",
            TokenKind::Let => "Let",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A token with its source text and byte offset.
///
/// For strings `value` is the unescaped contents and `pos` the offset just
/// past the opening quote. For params `value` excludes the `$` and `pos`
/// points past it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub pos: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, pos: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            pos,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    /// `Kind: value`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.value)
    }
}
