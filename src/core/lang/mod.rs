//! Policy expression language: lexer, syntax tree and parser

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{AstNode, EqualityOperator, NodeKind};
pub use lexer::{tokenize, Lexer};
pub use parser::{parse, Parser};
pub use token::{Token, TokenKind};
