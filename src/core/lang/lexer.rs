//! Expression lexer
//!
//! Tokens are pulled one at a time from a cursor. At every call the rules below
//! are tried in declaration order and the first one matching a prefix of the
//! remaining input wins (first match, not longest match):
//!
//! 1. whitespace (skipped)
//! 2. `,` `.` `(` `)`
//! 3. NUMBER `[0-9]+`
//! 4. VARIABLE `$` followed by identifier characters
//! 5. `==` / `!=`
//! 6. IDENTIFIER `[A-Za-z0-9_]+`
//! 7. STRING, double- or single-quoted, no escapes

use super::token::{Token, TokenKind};
use crate::error::{Result, RubacError};
use regex::Regex;
use std::sync::OnceLock;

/// What a matching rule produces
#[derive(Debug, Clone, Copy)]
enum Emit {
    Skip,
    Token(TokenKind),
    /// `==` or `!=`, resolved from the matched text
    Comparison,
}

struct Rule {
    pattern: Regex,
    emit: Emit,
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let table: [(&str, Emit); 11] = [
            (r"^\s+", Emit::Skip),
            (r"^,", Emit::Token(TokenKind::Comma)),
            (r"^\.", Emit::Token(TokenKind::Dot)),
            (r"^\(", Emit::Token(TokenKind::LParen)),
            (r"^\)", Emit::Token(TokenKind::RParen)),
            (r"^[0-9]+", Emit::Token(TokenKind::Number)),
            (r"^\$[A-Za-z0-9_]+", Emit::Token(TokenKind::Variable)),
            (r"^(?:==|!=)", Emit::Comparison),
            (r"^[A-Za-z0-9_]+", Emit::Token(TokenKind::Identifier)),
            (r#"^"[^"]*""#, Emit::Token(TokenKind::String)),
            (r"^'[^']*'", Emit::Token(TokenKind::String)),
        ];
        table.into_iter()
            .map(|(pattern, emit)| Rule {
                pattern: Regex::new(pattern).expect("lexer rule patterns are valid"),
                emit,
            })
            .collect()
    })
}

/// Pull-based lexer over a single expression string
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    cursor: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer { source, cursor: 0 }
    }

    /// The expression being lexed
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Current byte offset
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether unconsumed input remains (which may still be only whitespace)
    pub fn has_more(&self) -> bool {
        self.cursor < self.source.len()
    }

    /// Next token, or `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        while self.has_more() {
            let rest = &self.source[self.cursor..];
            let matched = rules()
                .iter()
                .find_map(|rule| rule.pattern.find(rest).map(|m| (rule.emit, m.end())));

            let Some((emit, len)) = matched else {
                let character = rest.chars().next().unwrap_or_default();
                return Err(RubacError::Lexical {
                    character,
                    offset: self.cursor,
                });
            };

            let offset = self.cursor;
            let text = &rest[..len];
            self.cursor += len;

            let kind = match emit {
                Emit::Skip => continue,
                Emit::Token(kind) => kind,
                Emit::Comparison if text == "==" => TokenKind::Equality,
                Emit::Comparison => TokenKind::Inequality,
            };
            return Ok(Some(Token::new(kind, text, offset)));
        }
        Ok(None)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Lex a whole expression eagerly
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>> {
    Lexer::new(source).collect()
}
