//! Policy evaluation service
//!
//! Holds the published [`WorkflowRegistry`] and answers decisions against it.
//! Decisions clone the current registry pointer and run without holding any
//! lock; a reload builds a complete registry and swaps the pointer.

mod config;
mod loader;
mod registry;

pub use config::{ServiceConfig, POLICY_DIR_ENV};
pub use loader::{
    compile_all, discover, load_registry, load_with_timeout, read_sources, run_with_deadline,
    PolicySource,
};
pub use registry::WorkflowRegistry;

use crate::core::interpreter::{Builtins, DecisionInput};
use crate::error::{Result, RubacError};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PolicyService {
    config: ServiceConfig,
    builtins: Arc<Builtins>,
    registry: RwLock<Arc<WorkflowRegistry>>,
}

impl PolicyService {
    /// Load every policy under the configured directory with the standard builtins
    pub fn load(config: ServiceConfig) -> Result<Self> {
        Self::load_with_builtins(config, Builtins::standard())
    }

    /// Load with a custom builtin registry
    ///
    /// Rules may only call functions registered in `builtins`.
    pub fn load_with_builtins(config: ServiceConfig, builtins: Builtins) -> Result<Self> {
        config.validate()?;
        let builtins = Arc::new(builtins);
        let registry = load_with_timeout(&config, Arc::clone(&builtins))?;
        info!(
            workflows = registry.len(),
            fold = ?config.rule_fold,
            "policy service ready"
        );
        Ok(PolicyService {
            config,
            builtins,
            registry: RwLock::new(Arc::new(registry)),
        })
    }

    /// Serve an already built registry
    ///
    /// `builtins` must be the registry the workflows were compiled against.
    pub fn from_registry(
        registry: WorkflowRegistry,
        builtins: Builtins,
        config: ServiceConfig,
    ) -> Self {
        PolicyService {
            config,
            builtins: Arc::new(builtins),
            registry: RwLock::new(Arc::new(registry)),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Current registry; unaffected by later reloads
    pub fn snapshot(&self) -> Arc<WorkflowRegistry> {
        Arc::clone(&self.registry.read())
    }

    /// Decide for `policy_id`, surfacing failures
    ///
    /// Fails with a configuration error when the id is unknown and with an
    /// execution error when a rule cannot be evaluated.
    pub fn check(&self, input: &DecisionInput, policy_id: &str) -> Result<bool> {
        let registry = self.snapshot();
        let workflow = registry.get(policy_id).ok_or_else(|| {
            RubacError::Configuration(format!("policy '{}' is not registered", policy_id))
        })?;
        workflow.decide(input, &self.builtins, self.config.rule_fold)
    }

    /// Decide for `policy_id`, denying on any failure
    pub fn decide(&self, input: &DecisionInput, policy_id: &str) -> bool {
        match self.check(input, policy_id) {
            Ok(allowed) => {
                debug!(policy_id, allowed, "decision");
                allowed
            }
            Err(e) => {
                warn!(policy_id, error = %e, "decision failed, denying");
                false
            }
        }
    }

    /// Rebuild the registry from disk and publish it
    ///
    /// On failure the current registry stays in place.
    pub fn reload(&self) -> Result<usize> {
        let registry = load_with_timeout(&self.config, Arc::clone(&self.builtins))?;
        let count = registry.len();
        *self.registry.write() = Arc::new(registry);
        info!(workflows = count, "policy registry swapped");
        Ok(count)
    }
}

impl std::fmt::Debug for PolicyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyService")
            .field("config", &self.config)
            .field("workflows", &self.registry.read().len())
            .finish()
    }
}
