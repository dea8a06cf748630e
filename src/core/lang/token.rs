//! Tokens produced by the expression lexer

use std::fmt;

/// Token kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// Unsigned integer digits
    Number,
    /// `$name`, sigil included in the token text
    Variable,
    /// `==`
    Equality,
    /// `!=`
    Inequality,
    /// Bare word
    Identifier,
    /// Single- or double-quoted string, quotes included in the token text
    String,
}

impl TokenKind {
    /// How the kind reads in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Number => "NUMBER",
            TokenKind::Variable => "VARIABLE",
            TokenKind::Equality => "'=='",
            TokenKind::Inequality => "'!='",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::String => "STRING",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A lexed token borrowing its text from the source expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the token in the source
    pub offset: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, offset: usize) -> Self {
        Token { kind, text, offset }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.text)
    }
}
