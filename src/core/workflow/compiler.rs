//! Workflow compilation and execution
//!
//! Compiling a [`PolicyDocument`] parses every expression once and runs the
//! static checks, so that no undeclared variable or unknown function can
//! reach decision time. The resulting [`CompiledWorkflow`] is immutable and
//! shared across threads.

use super::document::PolicyDocument;
use super::pattern::PathPattern;
use crate::core::interpreter::{
    evaluate, visit, Builtins, DecisionInput, ExecutionEnvironment, Value, VisitContext, Visitor,
    CONTEXT_VARIABLES,
};
use crate::core::lang::{parse, AstNode, NodeKind};
use crate::error::{Result, RubacError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// How rule results are folded into a decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleFold {
    /// A rule passes only when it yields boolean `true`
    #[default]
    Strict,
    /// A rule fails only when it yields boolean `false`
    Loose,
}

impl RuleFold {
    pub fn passes(self, value: &Value) -> bool {
        match self {
            RuleFold::Strict => value.as_bool() == Some(true),
            RuleFold::Loose => value.as_bool() != Some(false),
        }
    }
}

/// Named primary expression resolved before rules run
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDefinition {
    pub name: String,
    pub expression: String,
    pub compiled: AstNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleDefinition {
    pub name: String,
    pub expression: String,
    pub compiled: AstNode,
}

/// A policy document with every expression parsed and checked
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWorkflow {
    id: u64,
    name: String,
    path_pattern: PathPattern,
    params: Vec<ParamDefinition>,
    rules: Vec<RuleDefinition>,
}

impl CompiledWorkflow {
    /// Validate, parse and statically check a document
    ///
    /// Any failure rejects the whole document.
    pub fn compile(document: &PolicyDocument, builtins: &Builtins) -> Result<Self> {
        document.validate()?;

        let mut visible: HashSet<&str> = CONTEXT_VARIABLES.iter().copied().collect();
        let mut params = Vec::with_capacity(document.params.len());
        for param in &document.params {
            let compiled = parse(&param.expression)?;
            visit(
                &compiled,
                &mut PrimaryExpressionCheck {
                    visible: &visible,
                },
            )?;
            visible.insert(param.name.as_str());
            params.push(ParamDefinition {
                name: param.name.clone(),
                expression: param.expression.clone(),
                compiled,
            });
        }

        let declared: HashSet<&str> = document.params.iter().map(|p| p.name.as_str()).collect();
        let mut rules = Vec::with_capacity(document.rules.len());
        for rule in &document.rules {
            let compiled = parse(&rule.expression)?;
            visit(
                &compiled,
                &mut RuleCheck {
                    builtins,
                    declared: &declared,
                },
            )?;
            rules.push(RuleDefinition {
                name: rule.rule_name.clone(),
                expression: rule.expression.clone(),
                compiled,
            });
        }

        Ok(CompiledWorkflow {
            id: document.workflow_id,
            name: document.workflow_name.clone(),
            path_pattern: PathPattern::new(&document.path),
            params,
            rules,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Registry key
    pub fn policy_id(&self) -> String {
        self.id.to_string()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_pattern(&self) -> &PathPattern {
        &self.path_pattern
    }

    pub fn params(&self) -> &[ParamDefinition] {
        &self.params
    }

    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }

    pub fn applies_to(&self, path: &str) -> bool {
        self.path_pattern.matches(path)
    }

    /// Full decision for one request
    ///
    /// A request outside the path pattern is allowed without evaluating
    /// anything; otherwise params are resolved and every rule must pass.
    pub fn decide(
        &self,
        input: &DecisionInput,
        builtins: &Builtins,
        fold: RuleFold,
    ) -> Result<bool> {
        let path = input.request_path();
        if !self.applies_to(&path) {
            debug!(workflow = self.id, path = %path, "path not covered, allowing");
            return Ok(true);
        }
        self.execute(input, builtins, fold)
    }

    /// Resolve params and evaluate rules, ignoring the path pattern
    pub fn execute(
        &self,
        input: &DecisionInput,
        builtins: &Builtins,
        fold: RuleFold,
    ) -> Result<bool> {
        let mut env = ExecutionEnvironment::for_decision(builtins, input);
        self.resolve_params(&mut env)?;

        for rule in &self.rules {
            let value = evaluate(&rule.compiled, &env)?;
            let passed = fold.passes(&value);
            debug!(
                workflow = self.id,
                rule = %rule.name,
                result = %value,
                passed,
                "rule evaluated"
            );
            if !passed {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Bind every param into `env` in declaration order
    pub fn resolve_params(&self, env: &mut ExecutionEnvironment<'_>) -> Result<()> {
        for param in &self.params {
            let value = evaluate(&param.compiled, env)?;
            env.bind(param.name.as_str(), value);
        }
        Ok(())
    }
}

/// Params are restricted to variables, identifiers and member chains
/// over variables already in scope
struct PrimaryExpressionCheck<'a> {
    visible: &'a HashSet<&'a str>,
}

impl Visitor for PrimaryExpressionCheck<'_> {
    fn visit_any(&mut self, node: &AstNode, _cx: VisitContext<'_>) -> Result<()> {
        match node.kind() {
            NodeKind::MemberExpression | NodeKind::Variable | NodeKind::Identifier => Ok(()),
            other => Err(RubacError::Compilation(format!(
                "only primary expressions supported, got {}",
                other
            ))),
        }
    }

    fn visit_variable(&mut self, name: &str, _cx: VisitContext<'_>) -> Result<()> {
        if self.visible.contains(name) {
            Ok(())
        } else {
            Err(undeclared(name))
        }
    }
}

/// Rules may call builtin functions only and read declared params only
struct RuleCheck<'a> {
    builtins: &'a Builtins,
    declared: &'a HashSet<&'a str>,
}

impl Visitor for RuleCheck<'_> {
    fn visit_call_expression(&mut self, node: &AstNode, _cx: VisitContext<'_>) -> Result<()> {
        if let AstNode::CallExpression { callee, .. } = node {
            if callee.as_identifier().is_none() {
                return Err(RubacError::Compilation(format!(
                    "only builtin functions may be called, got {}",
                    callee.kind()
                )));
            }
        }
        Ok(())
    }

    fn visit_identifier(&mut self, name: &str, cx: VisitContext<'_>) -> Result<()> {
        if cx.is_callee() && !self.builtins.is_function(name) {
            return Err(RubacError::Compilation(format!(
                "function '{}' is not defined",
                name
            )));
        }
        Ok(())
    }

    fn visit_variable(&mut self, name: &str, _cx: VisitContext<'_>) -> Result<()> {
        if self.declared.contains(name) {
            Ok(())
        } else {
            Err(undeclared(name))
        }
    }
}

fn undeclared(name: &str) -> RubacError {
    RubacError::Compilation(format!("variable '{}' does not exist in workflow", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_fold() {
        assert!(RuleFold::Strict.passes(&Value::Bool(true)));
        assert!(!RuleFold::Strict.passes(&Value::Bool(false)));
        assert!(!RuleFold::Strict.passes(&Value::from("yes")));
        assert!(!RuleFold::Strict.passes(&Value::Undefined));
    }

    #[test]
    fn test_loose_fold() {
        assert!(RuleFold::Loose.passes(&Value::Bool(true)));
        assert!(!RuleFold::Loose.passes(&Value::Bool(false)));
        assert!(RuleFold::Loose.passes(&Value::from("")));
        assert!(RuleFold::Loose.passes(&Value::Number(0.0)));
    }

    #[test]
    fn test_fold_default_is_strict() {
        assert_eq!(RuleFold::default(), RuleFold::Strict);
    }
}
