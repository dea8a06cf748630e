//! Policy document structure
//!
//! One JSON document declares one protected path pattern, the parameters its
//! rules read, and the rules themselves:
//!
//! ```json
//! {
//!   "WorkflowID": 1,
//!   "WorkflowName": "Allow only specific IP for ADMIN",
//!   "Path": "admin/w1",
//!   "Params": [{ "Name": "ip_address", "Expression": "$request.getIpAddress" }],
//!   "Rules": [{ "RuleName": "Only specific IP", "Expression": "$ip_address == '100.100.100.100'" }]
//! }
//! ```

use crate::core::interpreter::CONTEXT_VARIABLES;
use crate::error::{Result, RubacError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A named parameter resolved before rules run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParamDeclaration {
    /// Variable name, referenced as `$name`
    pub name: String,
    /// Primary expression producing the value
    pub expression: String,
}

/// A boolean rule; all rules of a document must pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleDeclaration {
    pub rule_name: String,
    pub expression: String,
}

/// Raw policy document, as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    #[serde(rename = "WorkflowID")]
    pub workflow_id: u64,

    pub workflow_name: String,

    /// Slash-delimited pattern; a `*` segment matches the rest of the path
    pub path: String,

    #[serde(default)]
    pub params: Vec<ParamDeclaration>,

    #[serde(default)]
    pub rules: Vec<RuleDeclaration>,
}

impl PolicyDocument {
    /// Parse a document from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a document file
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Registry key of this document
    pub fn policy_id(&self) -> String {
        self.workflow_id.to_string()
    }

    /// Structural checks that do not need the expression compiler
    pub fn validate(&self) -> Result<()> {
        if self.workflow_name.trim().is_empty() {
            return Err(invalid("WorkflowName must not be empty"));
        }
        if self.path.trim().is_empty() {
            return Err(invalid("Path must not be empty"));
        }

        let mut names = HashSet::new();
        for (i, param) in self.params.iter().enumerate() {
            if !is_variable_name(&param.name) {
                return Err(invalid(format!(
                    "Param {} has invalid name '{}' (letters, digits and '_' only)",
                    i, param.name
                )));
            }
            if CONTEXT_VARIABLES.contains(&param.name.as_str()) {
                return Err(invalid(format!(
                    "Param '{}' shadows a built-in variable",
                    param.name
                )));
            }
            if !names.insert(param.name.as_str()) {
                return Err(invalid(format!("Param '{}' is declared twice", param.name)));
            }
            if param.expression.trim().is_empty() {
                return Err(invalid(format!("Param '{}' has no expression", param.name)));
            }
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if rule.rule_name.trim().is_empty() {
                return Err(invalid(format!("Rule {} has no name", i)));
            }
            if rule.expression.trim().is_empty() {
                return Err(invalid(format!("Rule '{}' has no expression", rule.rule_name)));
            }
        }

        Ok(())
    }
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid(message: impl Into<String>) -> RubacError {
    RubacError::InvalidDocument(message.into())
}
