//! Recursive-descent parser for policy expressions
//!
//! Grammar, lowest binding first:
//!
//! ```text
//! Expression           := BinaryExpression
//! BinaryExpression     := UnaryExpression ( ("==" | "!=") PrimaryExpression )?
//! UnaryExpression      := CallMemberExpression
//! CallMemberExpression := MemberExpression ( "(" ArgumentList? ")" )?
//! MemberExpression     := PrimaryExpression ( "." Identifier )*
//! PrimaryExpression    := Variable | Identifier | Literal
//! Literal              := Number | String
//! ArgumentList         := Argument ( "," Argument )*
//! Argument             := Variable | Identifier | Literal
//! ```
//!
//! One token of lookahead. The whole input must be consumed, so chained
//! comparisons and trailing tokens are rejected.

use super::ast::{AstNode, EqualityOperator};
use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use crate::error::{Result, RubacError};

/// Parse a complete expression
pub fn parse(source: &str) -> Result<AstNode> {
    Parser::new(source)?.parse()
}

/// Single-use parser over one expression
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<Token<'a>>,
}

impl<'a> Parser<'a> {
    /// Prime the lexer to obtain the first lookahead token
    pub fn new(source: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let lookahead = lexer.next_token()?;
        Ok(Parser { lexer, lookahead })
    }

    /// Parse the expression and require end of input
    pub fn parse(mut self) -> Result<AstNode> {
        let expression = self.expression()?;
        match self.lookahead {
            None => Ok(expression),
            Some(token) => Err(self.syntax_error(format!(
                "Unexpected token {}, expected end of input",
                token
            ))),
        }
    }

    fn expression(&mut self) -> Result<AstNode> {
        self.binary_expression()
    }

    fn binary_expression(&mut self) -> Result<AstNode> {
        let left = self.unary_expression()?;

        let operator = match self.peek_kind() {
            Some(TokenKind::Equality) => EqualityOperator::Eq,
            Some(TokenKind::Inequality) => EqualityOperator::NotEq,
            _ => return Ok(left),
        };
        self.advance()?;

        let right = self.primary_expression()?;
        Ok(AstNode::equality(operator, left, right))
    }

    fn unary_expression(&mut self) -> Result<AstNode> {
        self.call_member_expression()
    }

    fn call_member_expression(&mut self) -> Result<AstNode> {
        let member = self.member_expression()?;

        if self.peek_kind() == Some(TokenKind::LParen) {
            let arguments = self.arguments()?;
            return Ok(AstNode::call(member, arguments));
        }

        Ok(member)
    }

    fn arguments(&mut self) -> Result<Vec<AstNode>> {
        self.eat(TokenKind::LParen)?;

        let arguments = if self.peek_kind() == Some(TokenKind::RParen) {
            Vec::new()
        } else {
            self.argument_list()?
        };

        self.eat(TokenKind::RParen)?;
        Ok(arguments)
    }

    fn argument_list(&mut self) -> Result<Vec<AstNode>> {
        let mut arguments = vec![self.argument()?];
        while self.peek_kind() == Some(TokenKind::Comma) {
            self.advance()?;
            arguments.push(self.argument()?);
        }
        Ok(arguments)
    }

    fn argument(&mut self) -> Result<AstNode> {
        self.primary_expression()
    }

    /// Left-associative: `a.b.c` folds to `(a.b).c`
    fn member_expression(&mut self) -> Result<AstNode> {
        let mut object = self.primary_expression()?;

        while self.peek_kind() == Some(TokenKind::Dot) {
            self.advance()?;
            let property = self.identifier()?;
            object = AstNode::member(object, property);
        }

        Ok(object)
    }

    fn primary_expression(&mut self) -> Result<AstNode> {
        match self.peek_kind() {
            Some(TokenKind::Variable) => self.variable(),
            Some(TokenKind::Identifier) => self.identifier(),
            _ => self.literal(),
        }
    }

    fn variable(&mut self) -> Result<AstNode> {
        let token = self.eat(TokenKind::Variable)?;
        let name = token.text.trim_start_matches('$');
        Ok(AstNode::Variable(name.to_string()))
    }

    fn identifier(&mut self) -> Result<AstNode> {
        let token = self.eat(TokenKind::Identifier)?;
        Ok(AstNode::Identifier(token.text.to_string()))
    }

    fn literal(&mut self) -> Result<AstNode> {
        match self.lookahead {
            Some(token) if token.kind == TokenKind::Number => self.numeric_literal(),
            Some(token) if token.kind == TokenKind::String => self.string_literal(),
            Some(token) => Err(self.syntax_error(format!(
                "Unexpected token {}, expected a variable, identifier or literal",
                token
            ))),
            None => Err(self.syntax_error(
                "Unexpected end of input, expected a variable, identifier or literal".to_string(),
            )),
        }
    }

    fn numeric_literal(&mut self) -> Result<AstNode> {
        let token = self.eat(TokenKind::Number)?;
        let value = token.text.parse::<f64>().map_err(|e| {
            self.syntax_error(format!("Invalid number {}: {}", token, e))
        })?;
        Ok(AstNode::NumericLiteral(value))
    }

    fn string_literal(&mut self) -> Result<AstNode> {
        let token = self.eat(TokenKind::String)?;
        // Strip the surrounding quote pair; contents are taken verbatim
        let value = &token.text[1..token.text.len() - 1];
        Ok(AstNode::StringLiteral(value.to_string()))
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.lookahead.map(|token| token.kind)
    }

    fn advance(&mut self) -> Result<()> {
        self.lookahead = self.lexer.next_token()?;
        Ok(())
    }

    /// Consume a token of the expected kind
    fn eat(&mut self, expected: TokenKind) -> Result<Token<'a>> {
        match self.lookahead {
            None => Err(self.syntax_error(format!(
                "Unexpected end of input, expected {}",
                expected
            ))),
            Some(token) if token.kind != expected => Err(self.syntax_error(format!(
                "Unexpected token {}, expected {}",
                token, expected
            ))),
            Some(token) => {
                self.advance()?;
                Ok(token)
            }
        }
    }

    fn syntax_error(&self, message: String) -> RubacError {
        RubacError::Syntax {
            message,
            expression: self.lexer.source().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> AstNode {
        AstNode::Variable(name.to_string())
    }

    fn ident(name: &str) -> AstNode {
        AstNode::Identifier(name.to_string())
    }

    fn string(value: &str) -> AstNode {
        AstNode::StringLiteral(value.to_string())
    }

    fn syntax_message(source: &str) -> String {
        match parse(source) {
            Err(RubacError::Syntax { message, expression }) => {
                assert_eq!(expression, source);
                message
            }
            other => panic!("expected syntax error for {:?}, got {:?}", source, other),
        }
    }

    #[test]
    fn test_equality_expression() {
        assert_eq!(
            parse("$ip_address == '100.100.100.100'").unwrap(),
            AstNode::equality(EqualityOperator::Eq, var("ip_address"), string("100.100.100.100"))
        );
        assert_eq!(
            parse("$user_role != \"USER\"").unwrap(),
            AstNode::equality(EqualityOperator::NotEq, var("user_role"), string("USER"))
        );
    }

    #[test]
    fn test_call_expression() {
        assert_eq!(
            parse("in($user_role, 'ADMIN', 'SUPER_ADMIN')").unwrap(),
            AstNode::call(
                ident("in"),
                vec![var("user_role"), string("ADMIN"), string("SUPER_ADMIN")]
            )
        );
        assert_eq!(parse("now()").unwrap(), AstNode::call(ident("now"), vec![]));
    }

    #[test]
    fn test_member_expression_is_left_associative() {
        assert_eq!(
            parse("$request.headers.host").unwrap(),
            AstNode::member(
                AstNode::member(var("request"), ident("headers")),
                ident("host")
            )
        );
    }

    #[test]
    fn test_call_result_compared() {
        assert_eq!(
            parse("ip_range($ip, '10.0.0.0/8') == 1").unwrap(),
            AstNode::equality(
                EqualityOperator::Eq,
                AstNode::call(ident("ip_range"), vec![var("ip"), string("10.0.0.0/8")]),
                AstNode::NumericLiteral(1.0)
            )
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("42").unwrap(), AstNode::NumericLiteral(42.0));
        assert_eq!(parse("''").unwrap(), string(""));
        assert_eq!(parse("  $user  ").unwrap(), var("user"));
    }

    #[test]
    fn test_display_round_trips_source_shape() {
        let source = "in($user_role, 'ADMIN', 7)";
        assert_eq!(parse(source).unwrap().to_string(), source);
        assert_eq!(parse("$a.b != 'x'").unwrap().to_string(), "$a.b != 'x'");
    }

    #[test]
    fn test_chained_comparison_rejected() {
        let message = syntax_message("$a == $b == $c");
        assert!(message.contains("expected end of input"), "{}", message);
    }

    #[test]
    fn test_unexpected_end_of_input() {
        assert!(syntax_message("").contains("Unexpected end of input"));
        assert!(syntax_message("$a ==").contains("Unexpected end of input"));
        assert!(syntax_message("in($a").contains("expected ')'"));
        assert!(syntax_message("$a.").contains("expected IDENTIFIER"));
    }

    #[test]
    fn test_unexpected_tokens() {
        assert!(syntax_message("in($a,)").contains("Unexpected token \")\""));
        assert!(syntax_message("$a.'b'").contains("expected IDENTIFIER"));
        assert!(syntax_message("== $a").contains("Unexpected token \"==\""));
        assert!(syntax_message("$a $b").contains("expected end of input"));
        // Right-hand side of a comparison is a primary expression only
        assert!(syntax_message("$a == $b.c").contains("expected end of input"));
    }

    #[test]
    fn test_lexical_errors_propagate() {
        assert!(matches!(
            parse("$a == @"),
            Err(RubacError::Lexical { character: '@', offset: 6 })
        ));
    }
}
