//! Immutable map of compiled workflows

use crate::core::workflow::CompiledWorkflow;
use crate::error::{Result, RubacError};
use std::collections::BTreeMap;
use tracing::warn;

/// Compiled workflows keyed by policy id
///
/// Built completely before it is published; never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    workflows: BTreeMap<String, CompiledWorkflow>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge workflows in order
    ///
    /// With `allow_duplicates` a later workflow replaces an earlier one with
    /// the same id; otherwise a repeated id is an error.
    pub fn from_workflows<I>(workflows: I, allow_duplicates: bool) -> Result<Self>
    where
        I: IntoIterator<Item = CompiledWorkflow>,
    {
        let mut registry = Self::new();
        for workflow in workflows {
            registry.insert(workflow, allow_duplicates)?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, workflow: CompiledWorkflow, allow_duplicates: bool) -> Result<()> {
        let id = workflow.policy_id();
        if let Some(existing) = self.workflows.get(&id) {
            if !allow_duplicates {
                return Err(RubacError::DuplicatePolicy(format!(
                    "{} (\"{}\" and \"{}\")",
                    id,
                    existing.name(),
                    workflow.name()
                )));
            }
            warn!(
                policy_id = %id,
                replaced = existing.name(),
                by = workflow.name(),
                "duplicate policy id, keeping the last loaded"
            );
        }
        self.workflows.insert(id, workflow);
        Ok(())
    }

    pub fn get(&self, policy_id: &str) -> Option<&CompiledWorkflow> {
        self.workflows.get(policy_id)
    }

    pub fn contains(&self, policy_id: &str) -> bool {
        self.workflows.contains_key(policy_id)
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    /// Policy ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledWorkflow> {
        self.workflows.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interpreter::Builtins;
    use crate::core::workflow::PolicyDocument;

    fn workflow(id: u64, name: &str) -> CompiledWorkflow {
        let doc = PolicyDocument {
            workflow_id: id,
            workflow_name: name.to_string(),
            path: "any/*".to_string(),
            params: Vec::new(),
            rules: Vec::new(),
        };
        CompiledWorkflow::compile(&doc, &Builtins::standard()).unwrap()
    }

    #[test]
    fn test_lookup() {
        let registry =
            WorkflowRegistry::from_workflows(vec![workflow(2, "b"), workflow(1, "a")], false)
                .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("1"));
        assert_eq!(registry.get("2").unwrap().name(), "b");
        assert!(registry.get("3").is_none());
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_duplicates_rejected_by_default() {
        let result = WorkflowRegistry::from_workflows(vec![workflow(1, "a"), workflow(1, "b")], false);
        assert!(matches!(result, Err(RubacError::DuplicatePolicy(_))));
    }

    #[test]
    fn test_duplicates_last_wins_when_allowed() {
        let registry =
            WorkflowRegistry::from_workflows(vec![workflow(1, "a"), workflow(1, "b")], true)
                .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("1").unwrap().name(), "b");
    }

    #[test]
    fn test_empty() {
        let registry = WorkflowRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.iter().count(), 0);
    }
}
