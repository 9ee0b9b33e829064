//! Lazy compilation of the third-party dependency tree.
//!
//! The walker never descends into the dependency directory. Instead, every
//! local reference into it becomes a *seed*, and the expander compiles the
//! transitive closure of each seed, following `requires_origin`.
//!
//! Two levels of structured concurrency are used:
//!
//! - the outer fan-out runs one closure per seed, bounded by a semaphore;
//! - each closure owns a [`JoinSet`] whose outstanding task count is the
//!   fan-in counter. A dependency is spawned onto the set *before* its
//!   parent's result is recorded, so the set can only drain once the whole
//!   closure has settled.
//!
//! The [`VisitedSet`] is shared by all closures of one build: a module is
//! claimed with an atomic check-and-insert before it is scheduled, so no
//! module is compiled twice even when several seeds reach it concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cube_graph::query_path::normalize_local;
use cube_graph::{ModuleType, ProcessedModule, QueryPath};
use dashmap::DashSet;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::{BuildError, Runtime, TransformEngine, TransformError, TransformRequest};

/// Root-relative paths that have been claimed for compilation.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    inner: Arc<DashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path`. Returns `true` only for the first caller.
    pub fn mark(&self, path: &str) -> bool {
        self.inner.insert(normalize_local(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.contains(&normalize_local(path))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Modules and recoverable failures gathered by one expansion.
#[derive(Debug, Default)]
pub struct ExpandOutcome {
    /// Compiled modules, grouped by seed in seed order.
    pub modules: Vec<ProcessedModule>,
    pub errors: Vec<BuildError>,
}

/// Compiles seeds and everything they transitively require.
pub struct DependencyExpander {
    closure: Closure,
    concurrency: usize,
}

#[derive(Clone)]
struct Closure {
    engine: Arc<dyn TransformEngine>,
    runtime: Arc<dyn Runtime>,
    root: Arc<Path>,
}

impl DependencyExpander {
    pub fn new(
        engine: Arc<dyn TransformEngine>,
        runtime: Arc<dyn Runtime>,
        root: impl Into<PathBuf>,
    ) -> Self {
        let root: PathBuf = root.into();
        Self {
            closure: Closure {
                engine,
                runtime,
                root: Arc::from(root),
            },
            concurrency: cube_config::DEFAULT_CONCURRENCY,
        }
    }

    /// Maximum number of seeds expanded at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Expand every unvisited seed into its dependency closure.
    ///
    /// Seeds already present in `visited` are skipped. Failures are logged
    /// and collected; they never stop sibling modules or other seeds.
    pub async fn expand<I, S>(&self, seeds: I, visited: &VisitedSet) -> ExpandOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut seeds_set: JoinSet<(usize, ExpandOutcome)> = JoinSet::new();
        let mut scheduled = 0usize;

        for seed in seeds {
            let seed = normalize_local(seed.as_ref());
            if !visited.mark(&seed) {
                tracing::debug!("{seed} already visited, skipped");
                continue;
            }

            let closure = self.closure.clone();
            let semaphore = Arc::clone(&semaphore);
            let visited = visited.clone();
            let order = scheduled;
            scheduled += 1;

            seeds_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (order, closure.resolve(seed, &visited).await)
            });
        }

        tracing::debug!("expanding {scheduled} dependency seeds");

        let mut settled = Vec::with_capacity(scheduled);
        let mut outcome = ExpandOutcome::default();
        while let Some(joined) = seeds_set.join_next().await {
            match joined {
                Ok(result) => settled.push(result),
                Err(e) => outcome.errors.push(BuildError::TransformFailure {
                    path: self.closure.root.display().to_string(),
                    message: format!("dependency expansion task failed: {e}"),
                }),
            }
        }

        settled.sort_by_key(|(order, _)| *order);
        for (_, part) in settled {
            outcome.modules.extend(part.modules);
            outcome.errors.extend(part.errors);
        }

        tracing::debug!(
            "expanded {} dependency modules, {} errors",
            outcome.modules.len(),
            outcome.errors.len()
        );
        outcome
    }
}

impl Closure {
    /// Compile `seed` and its transitive `requires_origin`. The seed must
    /// already be marked visited.
    async fn resolve(&self, seed: String, visited: &VisitedSet) -> ExpandOutcome {
        let mut outcome = ExpandOutcome::default();
        let mut pending: JoinSet<(String, crate::Result<ProcessedModule>)> = JoinSet::new();
        self.schedule(&mut pending, seed.clone());

        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok((_, Ok(module))) => {
                    for origin in &module.requires_origin {
                        if visited.mark(origin) {
                            self.schedule(&mut pending, origin.clone());
                        }
                    }
                    outcome.modules.push(module);
                }
                Ok((path, Err(err))) => {
                    tracing::warn!("dependency {path}: {err}");
                    outcome.errors.push(err);
                }
                Err(e) => {
                    tracing::warn!("dependency task failed: {e}");
                    outcome.errors.push(BuildError::TransformFailure {
                        path: seed.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        outcome
    }

    fn schedule(
        &self,
        pending: &mut JoinSet<(String, crate::Result<ProcessedModule>)>,
        real_path: String,
    ) {
        let closure = self.clone();
        pending.spawn(async move {
            let result = closure.compile(&real_path).await;
            (real_path, result)
        });
    }

    async fn compile(&self, real_path: &str) -> crate::Result<ProcessedModule> {
        let query_path = QueryPath::new(real_path).map_err(|e| BuildError::TransformFailure {
            path: real_path.to_string(),
            message: e.to_string(),
        })?;

        match self
            .engine
            .transform(TransformRequest::new(query_path.clone()))
            .await
        {
            Ok(module) => Ok(module),
            Err(TransformError::UnknownType { .. }) => self.verbatim(query_path).await,
            Err(err) => Err(err.into()),
        }
    }

    /// Unknown file types inside the dependency tree pass through untouched.
    async fn verbatim(&self, query_path: QueryPath) -> crate::Result<ProcessedModule> {
        let real_path = query_path.without_scheme().to_string();
        let fs_path = self.root.join(real_path.trim_start_matches('/'));
        let failed = |message: String| BuildError::TransformFailure {
            path: real_path.clone(),
            message,
        };

        let bytes = self
            .runtime
            .read_file(&fs_path)
            .await
            .map_err(|e| failed(e.to_string()))?;
        let code =
            String::from_utf8(bytes).map_err(|_| failed("source is not valid UTF-8".to_string()))?;

        tracing::info!("[copy file]: {}", real_path.trim_start_matches('/'));
        Ok(ProcessedModule::builder(query_path, ModuleType::Verbatim)
            .real_path(real_path.clone())
            .code(code)
            .wrap(false)
            .build())
    }
}
