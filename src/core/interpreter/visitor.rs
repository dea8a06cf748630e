//! Generic pre-order traversal over expression trees
//!
//! Used for compile-time checks. Every node is reported to
//! [`Visitor::visit_any`] first, then to its kind-specific hook, then its
//! children are walked in field order (`object`, `property`; `callee`,
//! `arguments[0..]`; `left`, `right`). A hook returning an error stops the walk.

use crate::core::lang::AstNode;
use crate::error::Result;

/// Position of a node relative to its parent
#[derive(Debug, Clone, Copy, Default)]
pub struct VisitContext<'a> {
    /// Enclosing node, `None` at the root
    pub parent: Option<&'a AstNode>,
    /// Parent field holding the node
    pub field: Option<&'static str>,
    /// Index within an array-valued field
    pub index: Option<usize>,
}

impl<'a> VisitContext<'a> {
    fn child(parent: &'a AstNode, field: &'static str, index: Option<usize>) -> Self {
        VisitContext {
            parent: Some(parent),
            field: Some(field),
            index,
        }
    }

    /// Whether the node sits in the callee slot of a call expression
    pub fn is_callee(&self) -> bool {
        matches!(self.parent, Some(AstNode::CallExpression { .. })) && self.field == Some("callee")
    }
}

/// Per-kind hooks with no-op defaults
#[allow(unused_variables)]
pub trait Visitor {
    /// Invoked on every node before its kind-specific hook
    fn visit_any(&mut self, node: &AstNode, cx: VisitContext<'_>) -> Result<()> {
        Ok(())
    }

    fn visit_numeric_literal(&mut self, value: f64, cx: VisitContext<'_>) -> Result<()> {
        Ok(())
    }

    fn visit_string_literal(&mut self, value: &str, cx: VisitContext<'_>) -> Result<()> {
        Ok(())
    }

    fn visit_identifier(&mut self, name: &str, cx: VisitContext<'_>) -> Result<()> {
        Ok(())
    }

    fn visit_variable(&mut self, name: &str, cx: VisitContext<'_>) -> Result<()> {
        Ok(())
    }

    fn visit_member_expression(&mut self, node: &AstNode, cx: VisitContext<'_>) -> Result<()> {
        Ok(())
    }

    fn visit_call_expression(&mut self, node: &AstNode, cx: VisitContext<'_>) -> Result<()> {
        Ok(())
    }

    fn visit_equality_expression(&mut self, node: &AstNode, cx: VisitContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Walk `root` and every descendant in pre-order
pub fn visit<V: Visitor + ?Sized>(root: &AstNode, visitor: &mut V) -> Result<()> {
    walk(root, VisitContext::default(), visitor)
}

fn walk<'a, V: Visitor + ?Sized>(
    node: &'a AstNode,
    cx: VisitContext<'a>,
    visitor: &mut V,
) -> Result<()> {
    visitor.visit_any(node, cx)?;

    match node {
        AstNode::NumericLiteral(value) => visitor.visit_numeric_literal(*value, cx),
        AstNode::StringLiteral(value) => visitor.visit_string_literal(value, cx),
        AstNode::Identifier(name) => visitor.visit_identifier(name, cx),
        AstNode::Variable(name) => visitor.visit_variable(name, cx),
        AstNode::MemberExpression { object, property } => {
            visitor.visit_member_expression(node, cx)?;
            walk(object, VisitContext::child(node, "object", None), visitor)?;
            walk(property, VisitContext::child(node, "property", None), visitor)
        }
        AstNode::CallExpression { callee, arguments } => {
            visitor.visit_call_expression(node, cx)?;
            walk(callee, VisitContext::child(node, "callee", None), visitor)?;
            for (index, argument) in arguments.iter().enumerate() {
                walk(
                    argument,
                    VisitContext::child(node, "arguments", Some(index)),
                    visitor,
                )?;
            }
            Ok(())
        }
        AstNode::EqualityExpression { left, right, .. } => {
            visitor.visit_equality_expression(node, cx)?;
            walk(left, VisitContext::child(node, "left", None), visitor)?;
            walk(right, VisitContext::child(node, "right", None), visitor)
        }
    }
}
