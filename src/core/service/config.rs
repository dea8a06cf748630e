//! Service configuration

use crate::core::workflow::RuleFold;
use crate::error::{Result, RubacError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the policy directory
pub const POLICY_DIR_ENV: &str = "RULES_FOLDER";

const DEFAULT_POLICY_DIR: &str = "policies";
const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;

/// Settings for loading policies and folding rule results
///
/// Loadable from TOML; missing keys take their defaults:
///
/// ```toml
/// policy_dir = "/etc/rubac/policies"
/// load_timeout_ms = 10000
/// rule_fold = "strict"
/// allow_duplicate_ids = false
/// max_compile_threads = 4
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Directory enumerated for `*.json` policy documents
    pub policy_dir: PathBuf,

    /// Deadline for the startup load, in milliseconds
    pub load_timeout_ms: u64,

    pub rule_fold: RuleFold,

    /// Let a later document replace an earlier one with the same id
    pub allow_duplicate_ids: bool,

    /// Upper bound on compile workers, defaults to available parallelism
    pub max_compile_threads: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            policy_dir: PathBuf::from(DEFAULT_POLICY_DIR),
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            rule_fold: RuleFold::default(),
            allow_duplicate_ids: false,
            max_compile_threads: None,
        }
    }
}

impl ServiceConfig {
    pub fn new(policy_dir: impl Into<PathBuf>) -> Self {
        ServiceConfig {
            policy_dir: policy_dir.into(),
            ..Default::default()
        }
    }

    /// Defaults with the policy directory taken from `RULES_FOLDER`
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ServiceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RubacError::Configuration(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply environment overrides through `lookup`
    ///
    /// Fails when no policy directory can be resolved.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(POLICY_DIR_ENV) {
            Some(dir) if !dir.trim().is_empty() => self.policy_dir = PathBuf::from(dir),
            Some(_) => {
                return Err(RubacError::Configuration(format!(
                    "{} is set but empty",
                    POLICY_DIR_ENV
                )))
            }
            None => {}
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_rule_fold(mut self, fold: RuleFold) -> Self {
        self.rule_fold = fold;
        self
    }

    pub fn with_duplicate_ids(mut self, allow: bool) -> Self {
        self.allow_duplicate_ids = allow;
        self
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_compile_threads(mut self, threads: usize) -> Self {
        self.max_compile_threads = Some(threads);
        self
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Worker count for compiling `documents` documents
    pub fn compile_threads(&self, documents: usize) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let cap = self.max_compile_threads.unwrap_or(available);
        cap.min(documents).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.policy_dir.as_os_str().is_empty() {
            return Err(RubacError::Configuration(
                "policy_dir must not be empty".to_string(),
            ));
        }
        if self.load_timeout_ms == 0 {
            return Err(RubacError::Configuration(
                "load_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_compile_threads == Some(0) {
            return Err(RubacError::Configuration(
                "max_compile_threads must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.policy_dir, PathBuf::from("policies"));
        assert_eq!(config.load_timeout(), Duration::from_secs(30));
        assert_eq!(config.rule_fold, RuleFold::Strict);
        assert!(!config.allow_duplicate_ids);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("rubac.toml");
        fs::write(
            &path,
            r#"
policy_dir = "/etc/rubac/policies"
load_timeout_ms = 5000
rule_fold = "loose"
allow_duplicate_ids = true
max_compile_threads = 2
"#,
        )
        .unwrap();

        let config = ServiceConfig::from_file(&path).unwrap();
        assert_eq!(config.policy_dir, PathBuf::from("/etc/rubac/policies"));
        assert_eq!(config.load_timeout(), Duration::from_secs(5));
        assert_eq!(config.rule_fold, RuleFold::Loose);
        assert!(config.allow_duplicate_ids);
        assert_eq!(config.max_compile_threads, Some(2));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("policy_dir = \"rules\"").unwrap();
        assert_eq!(config.policy_dir, PathBuf::from("rules"));
        assert_eq!(config.load_timeout_ms, 30_000);
        assert_eq!(config.rule_fold, RuleFold::Strict);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            ServiceConfig::from_toml_str("rule_fold = \"sometimes\""),
            Err(RubacError::Config(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml_str("unknown_key = 1"),
            Err(RubacError::Config(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml_str("load_timeout_ms = 0"),
            Err(RubacError::Configuration(_))
        ));
        assert!(matches!(
            ServiceConfig::from_file(Path::new("/nonexistent/rubac.toml")),
            Err(RubacError::Configuration(_))
        ));
    }

    #[test]
    fn test_env_override() {
        let config = ServiceConfig::default()
            .with_env_overrides(|key| (key == POLICY_DIR_ENV).then(|| "/srv/rules".to_string()))
            .unwrap();
        assert_eq!(config.policy_dir, PathBuf::from("/srv/rules"));

        let unchanged = ServiceConfig::new("local")
            .with_env_overrides(|_| None)
            .unwrap();
        assert_eq!(unchanged.policy_dir, PathBuf::from("local"));

        assert!(ServiceConfig::default()
            .with_env_overrides(|_| Some("  ".to_string()))
            .is_err());
    }

    #[test]
    fn test_sub_second_timeout() {
        let config = ServiceConfig::default().with_load_timeout(Duration::from_millis(25));
        assert_eq!(config.load_timeout_ms, 25);
        assert_eq!(config.load_timeout(), Duration::from_millis(25));
        assert!(config.validate().is_ok());

        let zero = ServiceConfig::default().with_load_timeout(Duration::ZERO);
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_compile_threads() {
        let config = ServiceConfig::default().with_max_compile_threads(4);
        assert_eq!(config.compile_threads(10), 4);
        assert_eq!(config.compile_threads(2), 2);
        assert_eq!(config.compile_threads(0), 1);

        let zero = ServiceConfig::default().with_max_compile_threads(0);
        assert!(zero.validate().is_err());
    }
}
