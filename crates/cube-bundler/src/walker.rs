//! Concurrent source-tree walker.
//!
//! Directories are enumerated one at a time through the [`Runtime`]; every
//! file is handed to a [`FileVisitor`] on its own task as soon as it is found.
//! The walk completes once enumeration has finished *and* every spawned visit
//! has settled.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cube_graph::ProcessedModule;
use cube_graph::query_path::{is_within, normalize_local};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::{BuildError, Result, Runtime, RuntimeError};

/// A file found by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Absolute on-disk path.
    pub path: PathBuf,
    /// Path relative to the project root, e.g. `/src/app.js`.
    pub rel_path: String,
}

/// What happened to one visited file.
#[derive(Debug)]
pub enum VisitOutcome {
    /// Excluded by the classifier; not counted.
    Ignored,
    /// Copied to the destination unchanged.
    Copied,
    Processed(ProcessedModule),
    Failed(BuildError),
}

#[async_trait]
pub trait FileVisitor: Send + Sync {
    async fn visit(&self, file: WalkedFile) -> VisitOutcome;
}

/// Aggregate result of one walk.
#[derive(Debug, Default)]
pub struct WalkSummary {
    /// Processed modules in discovery order.
    pub modules: Vec<ProcessedModule>,
    pub errors: Vec<BuildError>,
    /// Files copied, processed or failed.
    pub total: usize,
    pub elapsed: Duration,
}

pub struct Walker {
    runtime: Arc<dyn Runtime>,
    root: PathBuf,
    dependency_dir: String,
    concurrency: Option<usize>,
}

impl Walker {
    /// A walker computing relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>, runtime: Arc<dyn Runtime>) -> Self {
        Self {
            runtime,
            root: root.into(),
            dependency_dir: cube_config::DEFAULT_DEPENDENCY_DIR.to_string(),
            concurrency: None,
        }
    }

    /// Transform failures under this directory are collected instead of
    /// aborting the walk.
    pub fn with_dependency_dir(mut self, dependency_dir: impl Into<String>) -> Self {
        self.dependency_dir = dependency_dir.into();
        self
    }

    /// Bound the number of concurrent visits; unbounded when `None`.
    pub fn with_concurrency(mut self, concurrency: Option<usize>) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Root-relative form of an absolute path.
    pub fn rel_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        normalize_local(&rel.to_string_lossy())
    }

    /// Walk `source`, visiting every file under it.
    ///
    /// `prune` receives each directory's relative path; returning `false`
    /// skips that subtree. A [`BuildError::TransformFailure`] for a file
    /// outside the dependency directory aborts the walk: outstanding visits
    /// are cancelled and the error is returned.
    pub async fn walk<P>(
        &self,
        source: &Path,
        prune: P,
        visitor: Arc<dyn FileVisitor>,
    ) -> Result<WalkSummary>
    where
        P: Fn(&str) -> bool,
    {
        let started = Instant::now();
        let semaphore = self.concurrency.map(|n| Arc::new(Semaphore::new(n.max(1))));
        let mut tasks: JoinSet<(usize, String, VisitOutcome)> = JoinSet::new();
        let mut modules: Vec<(usize, ProcessedModule)> = Vec::new();
        let mut summary = WalkSummary::default();
        let mut spawned = 0usize;

        tracing::debug!("walking {}", source.display());

        let meta = self
            .runtime
            .metadata(source)
            .await
            .map_err(|e| BuildError::Walk {
                path: source.to_path_buf(),
                source: e,
            })?;

        let mut stack = Vec::new();
        if meta.is_dir() {
            stack.push(source.to_path_buf());
        } else {
            self.spawn_visit(&mut tasks, &semaphore, &visitor, source.to_path_buf(), spawned);
            spawned += 1;
        }

        while let Some(dir) = stack.pop() {
            let mut names = match self.runtime.read_dir(&dir).await {
                Ok(names) => names,
                Err(e) if dir == source => {
                    return Err(BuildError::Walk {
                        path: dir,
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::warn!("cannot read {}: {}", dir.display(), e);
                    summary.errors.push(BuildError::Walk {
                        path: dir,
                        source: e,
                    });
                    continue;
                }
            };
            names.sort();

            let mut subdirs = Vec::new();
            for name in names {
                let path = dir.join(&name);
                match self.runtime.metadata(&path).await {
                    Ok(meta) if meta.is_dir() => {
                        if prune(&self.rel_path(&path)) {
                            subdirs.push(path);
                        } else {
                            tracing::debug!("pruned {}", self.rel_path(&path));
                        }
                    }
                    Ok(meta) if meta.is_file() => {
                        self.spawn_visit(&mut tasks, &semaphore, &visitor, path, spawned);
                        spawned += 1;
                    }
                    Ok(_) => tracing::debug!("skipping special file {}", path.display()),
                    Err(e) => summary.errors.push(BuildError::Walk { path, source: e }),
                }
            }
            // Reversed so the stack pops subdirectories in name order.
            stack.extend(subdirs.into_iter().rev());

            while let Some(joined) = tasks.try_join_next() {
                self.settle(joined, &mut summary, &mut modules, &mut tasks).await?;
            }
        }

        while let Some(joined) = tasks.join_next().await {
            self.settle(joined, &mut summary, &mut modules, &mut tasks).await?;
        }

        modules.sort_by_key(|(seq, _)| *seq);
        summary.modules = modules.into_iter().map(|(_, module)| module).collect();
        summary.elapsed = started.elapsed();

        tracing::debug!(
            "walked {}: {} files, {} modules, {} errors",
            source.display(),
            summary.total,
            summary.modules.len(),
            summary.errors.len()
        );

        Ok(summary)
    }

    fn spawn_visit(
        &self,
        tasks: &mut JoinSet<(usize, String, VisitOutcome)>,
        semaphore: &Option<Arc<Semaphore>>,
        visitor: &Arc<dyn FileVisitor>,
        path: PathBuf,
        seq: usize,
    ) {
        let rel_path = self.rel_path(&path);
        let visitor = Arc::clone(visitor);
        let semaphore = semaphore.clone();

        tasks.spawn(async move {
            let _permit = match semaphore {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            let file = WalkedFile {
                path,
                rel_path: rel_path.clone(),
            };
            let outcome = visitor.visit(file).await;
            (seq, rel_path, outcome)
        });
    }

    async fn settle(
        &self,
        joined: std::result::Result<(usize, String, VisitOutcome), JoinError>,
        summary: &mut WalkSummary,
        modules: &mut Vec<(usize, ProcessedModule)>,
        tasks: &mut JoinSet<(usize, String, VisitOutcome)>,
    ) -> Result<()> {
        let (seq, rel_path, outcome) = match joined {
            Ok(result) => result,
            Err(e) => {
                summary.errors.push(BuildError::Walk {
                    path: self.root.clone(),
                    source: RuntimeError::Interrupted(format!("visit task failed: {e}")),
                });
                return Ok(());
            }
        };

        match outcome {
            VisitOutcome::Ignored => {}
            VisitOutcome::Copied => summary.total += 1,
            VisitOutcome::Processed(module) => {
                summary.total += 1;
                modules.push((seq, module));
            }
            VisitOutcome::Failed(err) => {
                summary.total += 1;
                if matches!(err, BuildError::TransformFailure { .. })
                    && !is_within(&rel_path, &self.dependency_dir)
                {
                    tracing::error!("{err}");
                    tasks.shutdown().await;
                    return Err(err);
                }
                tracing::warn!("{err}");
                summary.errors.push(err);
            }
        }
        Ok(())
    }
}
