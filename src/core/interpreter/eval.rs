//! Tree-walking evaluation of expression nodes

use super::environment::ExecutionEnvironment;
use super::value::Value;
use crate::core::lang::{AstNode, EqualityOperator};
use crate::error::{Result, RubacError};

/// Evaluate a node against an environment
///
/// Pure with respect to the tree and environment: the same node evaluated
/// against an unchanged environment yields the same value.
pub fn evaluate(node: &AstNode, env: &ExecutionEnvironment<'_>) -> Result<Value> {
    match node {
        AstNode::NumericLiteral(value) => Ok(Value::Number(*value)),
        AstNode::StringLiteral(value) => Ok(Value::String(value.clone())),
        // Unknown identifiers evaluate to their own name so they can act as member keys
        AstNode::Identifier(name) => Ok(env
            .predefined(name)
            .cloned()
            .unwrap_or_else(|| Value::String(name.clone()))),
        AstNode::Variable(name) => match env.variable(name) {
            Some(value) if !value.is_undefined() => Ok(value.clone()),
            _ => Err(RubacError::Execution(format!(
                "variable '{}' could not be resolved",
                name
            ))),
        },
        AstNode::MemberExpression { object, property } => {
            let target = evaluate(object, env)?;
            let key = member_key(property, env)?;
            match lookup(&target, &key)? {
                // Accessors are read without call syntax
                Value::Function(accessor) => accessor.call(&[]),
                value => Ok(value),
            }
        }
        AstNode::CallExpression { callee, arguments } => {
            let Value::Function(function) = evaluate(callee, env)? else {
                return Err(RubacError::Execution(format!(
                    "'{}' is not a function",
                    callee
                )));
            };
            let arguments = arguments
                .iter()
                .map(|argument| evaluate(argument, env))
                .collect::<Result<Vec<_>>>()?;
            function.call(&arguments)
        }
        AstNode::EqualityExpression {
            operator,
            left,
            right,
        } => {
            let left = evaluate(left, env)?;
            let right = evaluate(right, env)?;
            let equal = left.strict_eq(&right);
            Ok(Value::Bool(match operator {
                EqualityOperator::Eq => equal,
                EqualityOperator::NotEq => !equal,
            }))
        }
    }
}

fn member_key(property: &AstNode, env: &ExecutionEnvironment<'_>) -> Result<String> {
    match evaluate(property, env)? {
        Value::String(key) => Ok(key),
        other => property.as_identifier().map(str::to_string).ok_or_else(|| {
            RubacError::Execution(format!("invalid member key {}", other))
        }),
    }
}

fn lookup(target: &Value, key: &str) -> Result<Value> {
    match target {
        Value::Object(object) => Ok(object.get(key).unwrap_or_default()),
        Value::Undefined => Err(RubacError::Execution(format!(
            "cannot read member '{}' of undefined",
            key
        ))),
        _ => Ok(Value::Undefined),
    }
}
