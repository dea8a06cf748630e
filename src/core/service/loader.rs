//! Startup loading of policy documents
//!
//! Documents are read from disk in file-name order, compiled in parallel on
//! scoped worker threads, then merged into a [`WorkflowRegistry`] on the
//! calling thread. Any failure aborts the whole load.

use super::config::ServiceConfig;
use super::registry::WorkflowRegistry;
use crate::core::interpreter::Builtins;
use crate::core::workflow::{CompiledWorkflow, PolicyDocument};
use crate::error::{Result, RubacError};
use crossbeam::channel::{self, RecvTimeoutError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLICY_EXTENSION: &str = "json";

/// A parsed document and where it came from
#[derive(Debug, Clone)]
pub struct PolicySource {
    pub origin: String,
    pub document: PolicyDocument,
}

impl PolicySource {
    pub fn new(origin: impl Into<String>, document: PolicyDocument) -> Self {
        PolicySource {
            origin: origin.into(),
            document,
        }
    }

    fn compile(&self, builtins: &Builtins) -> Result<CompiledWorkflow> {
        CompiledWorkflow::compile(&self.document, builtins)
            .map_err(|e| e.in_document(self.origin.as_str()))
    }
}

/// Policy files in `dir`, sorted by file name
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RubacError::Load(format!(
            "policy directory {} does not exist",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_policy = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(POLICY_EXTENSION));
        if is_policy {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read and parse every file, tagging failures with the file path
pub fn read_sources(paths: &[PathBuf]) -> Result<Vec<PolicySource>> {
    paths
        .iter()
        .map(|path| {
            let origin = path.display().to_string();
            PolicyDocument::from_file(path)
                .map(|document| PolicySource::new(origin.as_str(), document))
                .map_err(|e| e.in_document(origin))
        })
        .collect()
}

/// Compile sources on up to `threads` workers, preserving input order
pub fn compile_all(
    sources: &[PolicySource],
    builtins: &Builtins,
    threads: usize,
) -> Result<Vec<CompiledWorkflow>> {
    if sources.is_empty() {
        return Ok(Vec::new());
    }
    let chunk_size = sources.len().div_ceil(threads.max(1));

    let chunks = crossbeam::scope(|scope| {
        let handles: Vec<_> = sources
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move |_| {
                    chunk
                        .iter()
                        .map(|source| source.compile(builtins))
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| RubacError::Load("compile worker panicked".to_string()))?
            })
            .collect::<Result<Vec<_>>>()
    })
    .map_err(|_| RubacError::Load("compile worker panicked".to_string()))??;

    Ok(chunks.into_iter().flatten().collect())
}

/// Load and compile every document under the configured directory
pub fn load_registry(config: &ServiceConfig, builtins: &Builtins) -> Result<WorkflowRegistry> {
    let started = Instant::now();
    let paths = discover(&config.policy_dir)?;
    let sources = read_sources(&paths)?;
    let threads = config.compile_threads(sources.len());
    debug!(documents = sources.len(), threads, "compiling policy documents");

    let workflows = compile_all(&sources, builtins, threads)?;

    let mut registry = WorkflowRegistry::new();
    for (source, workflow) in sources.iter().zip(workflows) {
        let name = workflow.name().to_string();
        registry
            .insert(workflow, config.allow_duplicate_ids)
            .map_err(|e| e.in_document(source.origin.as_str()))?;
        info!(origin = %source.origin, "{} workflow loaded successfully", name);
    }

    info!(
        workflows = registry.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        dir = %config.policy_dir.display(),
        "policy registry built"
    );
    Ok(registry)
}

/// [`load_registry`] on a loader thread, bounded by the configured timeout
pub fn load_with_timeout(
    config: &ServiceConfig,
    builtins: Arc<Builtins>,
) -> Result<WorkflowRegistry> {
    let loader_config = config.clone();
    run_with_deadline(config.load_timeout(), move || {
        load_registry(&loader_config, &builtins)
    })
}

/// Run `load` on a detached loader thread and wait at most `timeout`
///
/// On expiry the thread keeps running and its result is dropped.
pub fn run_with_deadline<F>(timeout: Duration, load: F) -> Result<WorkflowRegistry>
where
    F: FnOnce() -> Result<WorkflowRegistry> + Send + 'static,
{
    let (tx, rx) = channel::bounded(1);

    thread::Builder::new()
        .name("rubac-loader".to_string())
        .spawn(move || {
            // Receiver may be gone after a timeout
            let _ = tx.send(load());
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "policy load timed out");
            Err(RubacError::LoadTimeout(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => Err(RubacError::Load(
            "loader thread exited without a result".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn policy_json(id: u64, path: &str) -> String {
        format!(
            r#"{{
                "WorkflowID": {id},
                "WorkflowName": "policy {id}",
                "Path": "{path}",
                "Params": [{{ "Name": "role", "Expression": "$user.getRole" }}],
                "Rules": [{{ "RuleName": "admin", "Expression": "$role == 'ADMIN'" }}]
            }}"#
        )
    }

    #[test]
    fn test_discover_sorted_json_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.JSON"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let names: Vec<_> = discover(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JSON", "b.json"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        assert!(matches!(
            discover(Path::new("/nonexistent/rubac/policies")),
            Err(RubacError::Load(_))
        ));
    }

    #[test]
    fn test_compile_all_preserves_order() {
        let sources: Vec<_> = (1..=9)
            .map(|id| {
                let doc = PolicyDocument::from_json(&policy_json(id, "p/*")).unwrap();
                PolicySource::new(format!("doc{}", id), doc)
            })
            .collect();

        for threads in [1, 2, 4, 16] {
            let ids: Vec<_> = compile_all(&sources, &Builtins::standard(), threads)
                .unwrap()
                .iter()
                .map(CompiledWorkflow::id)
                .collect();
            assert_eq!(ids, (1..=9).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_compile_error_names_document() {
        let bad = PolicyDocument::from_json(
            r#"{ "WorkflowID": 3, "WorkflowName": "bad", "Path": "x",
                 "Rules": [{ "RuleName": "r", "Expression": "$missing == 'a'" }] }"#,
        )
        .unwrap();
        let sources = vec![PolicySource::new("bad.json", bad)];

        match compile_all(&sources, &Builtins::standard(), 2) {
            Err(RubacError::Document { origin, source }) => {
                assert_eq!(origin, "bad.json");
                assert!(matches!(*source, RubacError::Compilation(_)));
            }
            other => panic!("expected document error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_registry() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("1.json"), policy_json(1, "admin/*")).unwrap();
        fs::write(dir.path().join("2.json"), policy_json(2, "users/*")).unwrap();

        let config = ServiceConfig::new(dir.path());
        let registry = load_registry(&config, &Builtins::standard()).unwrap();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_load_with_timeout_returns_result() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("1.json"), policy_json(1, "admin/*")).unwrap();

        let config = ServiceConfig::new(dir.path());
        let registry = load_with_timeout(&config, Arc::new(Builtins::standard())).unwrap();
        assert_eq!(registry.len(), 1);

        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let err = load_with_timeout(&config, Arc::new(Builtins::standard())).unwrap_err();
        assert!(matches!(err.root(), RubacError::Serialization(_)));
    }

    #[test]
    fn test_slow_load_times_out() {
        let timeout = Duration::from_millis(20);
        let result = run_with_deadline(timeout, || {
            thread::sleep(Duration::from_millis(500));
            Ok(WorkflowRegistry::new())
        });

        match result {
            Err(RubacError::LoadTimeout(elapsed)) => assert_eq!(elapsed, timeout),
            other => panic!("expected load timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_load_within_deadline() {
        let registry = run_with_deadline(Duration::from_secs(5), || {
            thread::sleep(Duration::from_millis(5));
            Ok(WorkflowRegistry::new())
        })
        .unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_loader_panic_is_load_error() {
        let result = run_with_deadline(Duration::from_secs(5), || panic!("loader died"));
        assert!(matches!(result, Err(RubacError::Load(_))));
    }

    #[test]
    fn test_config_timeout_reaches_loader() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("1.json"), policy_json(1, "admin/*")).unwrap();

        let config = ServiceConfig::new(dir.path()).with_load_timeout(Duration::from_millis(250));
        assert_eq!(config.load_timeout(), Duration::from_millis(250));
        let registry = load_with_timeout(&config, Arc::new(Builtins::standard())).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
