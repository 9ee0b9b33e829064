#![allow(clippy::disallowed_methods)]

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cube_bundler::{
    BuildError, DependencyExpander, ModuleType, NativeRuntime, ProcessedModule, QueryPath,
    TransformEngine, TransformError, TransformRequest, VisitedSet,
};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Engine backed by an in-memory dependency table that counts every call.
///
/// Paths ending in `.txt` are unknown types; paths containing `broken` fail.
struct CountingEngine {
    graph: HashMap<String, Vec<String>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl CountingEngine {
    fn new(edges: &[(&str, &[&str])]) -> Arc<Self> {
        Arc::new(Self {
            graph: edges
                .iter()
                .map(|(from, to)| (from.to_string(), to.iter().map(|t| t.to_string()).collect()))
                .collect(),
            calls: Mutex::new(HashMap::new()),
        })
    }

    fn calls(&self, path: &str) -> usize {
        self.calls.lock().get(path).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl TransformEngine for CountingEngine {
    async fn transform(
        &self,
        request: TransformRequest,
    ) -> Result<ProcessedModule, TransformError> {
        let path = request.real_path.clone();
        *self.calls.lock().entry(path.clone()).or_default() += 1;
        tokio::time::sleep(Duration::from_millis(2)).await;

        if path.ends_with(".txt") {
            return Err(TransformError::UnknownType { path });
        }
        if path.contains("broken") {
            return Err(TransformError::Failed {
                path,
                message: "unexpected token".to_string(),
            });
        }

        let deps = self.graph.get(&path).cloned().unwrap_or_default();
        Ok(
            ProcessedModule::builder(request.query_path, ModuleType::Script)
                .requires(deps.iter().map(|d| QueryPath::new(d).unwrap()).collect())
                .requires_origin(deps)
                .build(),
        )
    }
}

fn expander(engine: Arc<CountingEngine>, root: &std::path::Path) -> DependencyExpander {
    DependencyExpander::new(engine, Arc::new(NativeRuntime), root)
}

fn paths(modules: &[ProcessedModule]) -> Vec<&str> {
    let mut paths: Vec<_> = modules.iter().map(|m| m.query_path.as_str()).collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn diamond_closure_compiles_each_module_once() {
    let engine = CountingEngine::new(&[
        ("/nm/a.js", &["/nm/b.js", "/nm/c.js"]),
        ("/nm/b.js", &["/nm/d.js"]),
        ("/nm/c.js", &["/nm/d.js"]),
    ]);
    let dir = TempDir::new().unwrap();

    let outcome = expander(engine.clone(), dir.path())
        .expand(["/nm/a.js"], &VisitedSet::new())
        .await;

    assert_eq!(
        paths(&outcome.modules),
        vec!["/nm/a.js", "/nm/b.js", "/nm/c.js", "/nm/d.js"]
    );
    assert_eq!(engine.calls("/nm/d.js"), 1);
    assert_eq!(engine.total_calls(), 4);
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn cycles_terminate() {
    let engine = CountingEngine::new(&[
        ("/nm/a.js", &["/nm/b.js"]),
        ("/nm/b.js", &["/nm/c.js"]),
        ("/nm/c.js", &["/nm/a.js"]),
    ]);
    let dir = TempDir::new().unwrap();

    let outcome = expander(engine.clone(), dir.path())
        .expand(["/nm/a.js"], &VisitedSet::new())
        .await;

    assert_eq!(outcome.modules.len(), 3);
    assert_eq!(engine.total_calls(), 3);
}

#[tokio::test]
async fn overlapping_seeds_share_the_visited_set() {
    let edges: &[(&str, &[&str])] = &[
        ("/nm/x.js", &["/nm/shared.js", "/nm/x2.js"]),
        ("/nm/y.js", &["/nm/shared.js"]),
        ("/nm/shared.js", &["/nm/leaf.js"]),
    ];

    for concurrency in [1, 4] {
        let engine = CountingEngine::new(edges);
        let dir = TempDir::new().unwrap();
        let outcome = expander(engine.clone(), dir.path())
            .with_concurrency(concurrency)
            .expand(["/nm/x.js", "/nm/y.js", "/nm/x.js"], &VisitedSet::new())
            .await;

        assert_eq!(outcome.modules.len(), 5, "concurrency {concurrency}");
        for path in ["/nm/x.js", "/nm/y.js", "/nm/shared.js", "/nm/x2.js", "/nm/leaf.js"] {
            assert_eq!(engine.calls(path), 1, "{path} at concurrency {concurrency}");
        }
    }
}

#[tokio::test]
async fn already_visited_seeds_are_skipped() {
    let engine = CountingEngine::new(&[("/nm/a.js", &["/nm/b.js"])]);
    let dir = TempDir::new().unwrap();
    let visited = VisitedSet::new();
    assert!(visited.mark("/nm/b.js"));

    let outcome = expander(engine.clone(), dir.path())
        .expand(["/nm/a.js"], &visited)
        .await;

    assert_eq!(paths(&outcome.modules), vec!["/nm/a.js"]);
    assert_eq!(engine.calls("/nm/b.js"), 0);

    let again = expander(engine.clone(), dir.path())
        .expand(["/nm/a.js"], &visited)
        .await;
    assert!(again.modules.is_empty());
    assert_eq!(engine.calls("/nm/a.js"), 1);
}

#[tokio::test]
async fn failures_are_collected_without_stopping_siblings() {
    let engine = CountingEngine::new(&[(
        "/nm/a.js",
        &["/nm/broken.js", "/nm/ok.js"],
    )]);
    let dir = TempDir::new().unwrap();

    let outcome = expander(engine, dir.path())
        .expand(["/nm/a.js", "/nm/broken-seed.js"], &VisitedSet::new())
        .await;

    assert_eq!(paths(&outcome.modules), vec!["/nm/a.js", "/nm/ok.js"]);
    assert_eq!(outcome.errors.len(), 2);
    assert!(
        outcome
            .errors
            .iter()
            .all(|e| matches!(e, BuildError::TransformFailure { .. }))
    );
}

#[tokio::test]
async fn unknown_types_become_verbatim_modules() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("nm")).unwrap();
    fs::write(dir.path().join("nm/LICENSE.txt"), "MIT").unwrap();
    let engine = CountingEngine::new(&[("/nm/a.js", &["/nm/LICENSE.txt"])]);

    let outcome = expander(engine, dir.path())
        .expand(["/nm/a.js"], &VisitedSet::new())
        .await;

    let license = outcome
        .modules
        .iter()
        .find(|m| m.query_path.as_str() == "/nm/LICENSE.txt")
        .unwrap();
    assert_eq!(license.module_type, ModuleType::Verbatim);
    assert_eq!(license.code, "MIT");
    assert!(!license.wrap);
    assert!(license.requires.is_empty());
}

#[tokio::test]
async fn modules_are_grouped_by_seed_order() {
    let engine = CountingEngine::new(&[("/nm/first.js", &["/nm/first-dep.js"])]);
    let dir = TempDir::new().unwrap();

    let outcome = expander(engine, dir.path())
        .expand(["/nm/first.js", "/nm/second.js"], &VisitedSet::new())
        .await;

    let order: Vec<_> = outcome.modules.iter().map(|m| m.query_path.as_str()).collect();
    assert_eq!(order.last(), Some(&"/nm/second.js"));
}
