//! Expression syntax tree
//!
//! A closed sum over the seven node kinds. Nodes own their children, carry no
//! behavior and are never mutated after parsing; evaluation lives in
//! [`crate::core::interpreter`].

use std::fmt;

/// Comparison operator of an [`AstNode::Equality`] node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EqualityOperator {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
}

impl fmt::Display for EqualityOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EqualityOperator::Eq => f.write_str("=="),
            EqualityOperator::NotEq => f.write_str("!="),
        }
    }
}

/// Node kind tag, used for diagnostics and visitor dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    NumericLiteral,
    StringLiteral,
    Identifier,
    Variable,
    MemberExpression,
    CallExpression,
    EqualityExpression,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::NumericLiteral => "NumericLiteral",
            NodeKind::StringLiteral => "StringLiteral",
            NodeKind::Identifier => "Identifier",
            NodeKind::Variable => "Variable",
            NodeKind::MemberExpression => "MemberExpression",
            NodeKind::CallExpression => "CallExpression",
            NodeKind::EqualityExpression => "EqualityExpression",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expression syntax tree node
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    NumericLiteral(f64),
    StringLiteral(String),
    /// Bare word: a builtin function name or a member key
    Identifier(String),
    /// `$name`, stored without the sigil
    Variable(String),
    MemberExpression {
        object: Box<AstNode>,
        property: Box<AstNode>,
    },
    CallExpression {
        callee: Box<AstNode>,
        arguments: Vec<AstNode>,
    },
    EqualityExpression {
        operator: EqualityOperator,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
}

impl AstNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            AstNode::NumericLiteral(_) => NodeKind::NumericLiteral,
            AstNode::StringLiteral(_) => NodeKind::StringLiteral,
            AstNode::Identifier(_) => NodeKind::Identifier,
            AstNode::Variable(_) => NodeKind::Variable,
            AstNode::MemberExpression { .. } => NodeKind::MemberExpression,
            AstNode::CallExpression { .. } => NodeKind::CallExpression,
            AstNode::EqualityExpression { .. } => NodeKind::EqualityExpression,
        }
    }

    pub fn member(object: AstNode, property: AstNode) -> Self {
        AstNode::MemberExpression {
            object: Box::new(object),
            property: Box::new(property),
        }
    }

    pub fn call(callee: AstNode, arguments: Vec<AstNode>) -> Self {
        AstNode::CallExpression {
            callee: Box::new(callee),
            arguments,
        }
    }

    pub fn equality(operator: EqualityOperator, left: AstNode, right: AstNode) -> Self {
        AstNode::EqualityExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Identifier name, if this is an identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            AstNode::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

/// Renders the node back as expression source
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::NumericLiteral(value) => write!(f, "{}", value),
            AstNode::StringLiteral(value) if value.contains('\'') => write!(f, "\"{}\"", value),
            AstNode::StringLiteral(value) => write!(f, "'{}'", value),
            AstNode::Identifier(name) => f.write_str(name),
            AstNode::Variable(name) => write!(f, "${}", name),
            AstNode::MemberExpression { object, property } => write!(f, "{}.{}", object, property),
            AstNode::CallExpression { callee, arguments } => {
                write!(f, "{}(", callee)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                f.write_str(")")
            }
            AstNode::EqualityExpression {
                operator,
                left,
                right,
            } => write!(f, "{} {} {}", left, operator, right),
        }
    }
}
