//! Per-decision execution environment

use super::builtins::Builtins;
use super::capability::DecisionInput;
use super::value::Value;
use std::collections::HashMap;

/// Variable bound to the caller's user capability
pub const USER_VARIABLE: &str = "user";
/// Variable bound to the live request capability
pub const REQUEST_VARIABLE: &str = "request";
/// Variables every decision environment starts with
pub const CONTEXT_VARIABLES: [&str; 2] = [USER_VARIABLE, REQUEST_VARIABLE];

/// Names visible to an expression during one evaluation
///
/// Built fresh for every decision and dropped afterwards; predefined entries
/// are borrowed from the shared registry.
#[derive(Debug)]
pub struct ExecutionEnvironment<'a> {
    predefined: &'a Builtins,
    variables: HashMap<String, Value>,
}

impl<'a> ExecutionEnvironment<'a> {
    /// Environment with no variables bound
    pub fn new(predefined: &'a Builtins) -> Self {
        ExecutionEnvironment {
            predefined,
            variables: HashMap::new(),
        }
    }

    /// Environment with `$user` and `$request` bound from the decision input
    pub fn for_decision(predefined: &'a Builtins, input: &DecisionInput) -> Self {
        let mut env = Self::new(predefined);
        env.bind(USER_VARIABLE, input.user_value());
        env.bind(REQUEST_VARIABLE, input.request_value());
        env
    }

    pub fn predefined(&self, name: &str) -> Option<&Value> {
        self.predefined.get(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Bind or rebind a variable
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}
