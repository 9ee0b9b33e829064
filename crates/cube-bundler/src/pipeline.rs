//! Build operations: single file, whole directory, smart directory and
//! in-memory all-in-one bundles.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use cube_config::CubeConfig;
use cube_graph::query_path::is_within;
use cube_graph::{ModuleSet, ProcessedModule, QueryPath, dependency_first, merge};
use rustc_hash::FxHashSet;
use tokio::task::JoinSet;

use crate::walker::WalkedFile;
use crate::{
    BuildError, BuildReport, DependencyExpander, Emitter, FileClassifier, FileVisitor, IgnoreRules,
    Result, Runtime, StandardEngine, TransformEngine, TransformError, TransformRequest,
    VisitOutcome, VisitedSet, Walker,
};

/// Everything a build operation needs, shared across tasks.
#[derive(Clone)]
pub struct BuildContext {
    pub config: CubeConfig,
    /// Directory to walk; defaults to `config.root`.
    pub source: PathBuf,
    pub runtime: Arc<dyn Runtime>,
    pub engine: Arc<dyn TransformEngine>,
    pub classifier: Arc<dyn FileClassifier>,
}

impl BuildContext {
    pub fn new(
        config: CubeConfig,
        runtime: Arc<dyn Runtime>,
        engine: Arc<dyn TransformEngine>,
        classifier: Arc<dyn FileClassifier>,
    ) -> Self {
        Self {
            source: config.root.clone(),
            config,
            runtime,
            engine,
            classifier,
        }
    }

    /// Context with the standard engine and the project's ignore rules.
    pub async fn from_config(config: CubeConfig, runtime: Arc<dyn Runtime>) -> Result<Self> {
        let classifier = IgnoreRules::load(&config, runtime.as_ref()).await?;
        let engine = StandardEngine::from_config(&config, Arc::clone(&runtime));
        Ok(Self::new(
            config,
            runtime,
            Arc::new(engine),
            Arc::new(classifier),
        ))
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn TransformEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn emitter(&self) -> Result<Emitter> {
        Emitter::from_config(&self.config, Arc::clone(&self.runtime))
    }

    pub fn walker(&self) -> Walker {
        Walker::new(&self.config.root, Arc::clone(&self.runtime))
            .with_dependency_dir(self.config.dependency_dir.clone())
            .with_concurrency(self.config.walk_concurrency)
    }

    /// Root-relative path of the destination when it lies inside the walked
    /// tree, so it can be pruned.
    fn dest_within_source(&self) -> Option<String> {
        let dest = self.config.dest.as_ref()?;
        dest.starts_with(&self.source)
            .then(|| self.walker().rel_path(dest))
    }
}

/// What [`DirVisitor`] does with a processed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitMode {
    /// Write each module as soon as it is processed.
    Emit,
    /// Keep modules for a later merge; only copies are written.
    Collect,
}

/// The standard visitor for directory-wide builds.
///
/// Ignored files are dropped, skipped files and unknown file types are copied
/// byte for byte, and everything else goes through the transform engine.
pub struct DirVisitor {
    engine: Arc<dyn TransformEngine>,
    classifier: Arc<dyn FileClassifier>,
    emitter: Arc<Emitter>,
    mode: VisitMode,
}

impl DirVisitor {
    pub fn new(ctx: &BuildContext, emitter: Arc<Emitter>, mode: VisitMode) -> Self {
        Self {
            engine: Arc::clone(&ctx.engine),
            classifier: Arc::clone(&ctx.classifier),
            emitter,
            mode,
        }
    }

    async fn copy(&self, file: &WalkedFile) -> VisitOutcome {
        match self.emitter.copy(&file.path, &file.rel_path).await {
            Ok(()) => {
                tracing::info!("[copy file]: {}", file.rel_path.trim_start_matches('/'));
                VisitOutcome::Copied
            }
            Err(err) => VisitOutcome::Failed(err),
        }
    }
}

#[async_trait]
impl FileVisitor for DirVisitor {
    async fn visit(&self, file: WalkedFile) -> VisitOutcome {
        let checked = self.classifier.classify(&file.rel_path);
        if checked.ignore {
            tracing::debug!("[ignore file]: {}", file.rel_path.trim_start_matches('/'));
            return VisitOutcome::Ignored;
        }
        if checked.skip {
            return self.copy(&file).await;
        }

        let query_path = match QueryPath::new(&file.rel_path) {
            Ok(query_path) => query_path,
            Err(e) => {
                return VisitOutcome::Failed(BuildError::TransformFailure {
                    path: file.rel_path,
                    message: e.to_string(),
                });
            }
        };

        match self.engine.transform(TransformRequest::new(query_path)).await {
            Ok(module) => {
                if self.mode == VisitMode::Emit {
                    if let Err(err) = self.emitter.emit_module(&module).await {
                        return VisitOutcome::Failed(err);
                    }
                }
                VisitOutcome::Processed(module)
            }
            Err(TransformError::UnknownType { .. }) => self.copy(&file).await,
            Err(err) => VisitOutcome::Failed(err.into()),
        }
    }
}

/// Transform one file and, when a destination is configured, write it.
///
/// Returns `None` for a file of unknown type that was copied instead; without
/// a destination an unknown type is an error.
pub async fn process_file(ctx: &BuildContext, path: &Path) -> Result<Option<ProcessedModule>> {
    let rel_path = ctx.walker().rel_path(path);
    let query_path = QueryPath::new(&rel_path).map_err(|e| BuildError::TransformFailure {
        path: rel_path.clone(),
        message: e.to_string(),
    })?;

    let emitter = ctx.emitter().ok();
    match ctx.engine.transform(TransformRequest::new(query_path)).await {
        Ok(module) => {
            if let Some(emitter) = &emitter {
                emitter.emit_module(&module).await?;
            }
            Ok(Some(module))
        }
        Err(TransformError::UnknownType { path: unknown }) => match &emitter {
            Some(emitter) => {
                emitter.copy(path, &rel_path).await?;
                tracing::info!("[copying file]: {}", rel_path.trim_start_matches('/'));
                Ok(None)
            }
            None => {
                tracing::warn!("[unknown file type]: {}", rel_path.trim_start_matches('/'));
                Err(BuildError::UnknownFileType { path: unknown })
            }
        },
        Err(err) => Err(err.into()),
    }
}

/// Build every file under the source directory, writing each module as soon
/// as it is processed.
pub async fn process_dir(ctx: &BuildContext) -> Result<BuildReport> {
    let emitter = Arc::new(ctx.emitter()?);
    let started = Instant::now();
    let dest = ctx.dest_within_source();

    let visitor = Arc::new(DirVisitor::new(ctx, Arc::clone(&emitter), VisitMode::Emit));
    let summary = ctx
        .walker()
        .walk(
            &ctx.source,
            |rel| dest.as_deref() != Some(rel),
            visitor,
        )
        .await?;

    let mut errors = summary.errors;
    if let Err(err) = emitter.emit_runtime().await {
        errors.push(err);
    }

    Ok(BuildReport {
        errors,
        total: summary.total,
        elapsed: started.elapsed(),
    })
}

/// Build the application tree, compiling only the third-party files it
/// actually reaches, then merge and emit the module graph.
pub async fn process_dir_smart(ctx: &BuildContext) -> Result<BuildReport> {
    let emitter = Arc::new(ctx.emitter()?);
    let started = Instant::now();
    let dest = ctx.dest_within_source();
    let dependency_prefix = ctx.config.dependency_prefix();

    let visitor = Arc::new(DirVisitor::new(ctx, Arc::clone(&emitter), VisitMode::Collect));
    let summary = ctx
        .walker()
        .walk(
            &ctx.source,
            |rel| {
                rel != dependency_prefix
                    && !is_within(rel, &dependency_prefix)
                    && dest.as_deref() != Some(rel)
            },
            visitor,
        )
        .await?;
    tracing::debug!(
        "process app files: {} modules in {:?}",
        summary.modules.len(),
        summary.elapsed
    );

    let mut errors = summary.errors;
    let visited = VisitedSet::new();
    for module in &summary.modules {
        visited.mark(&module.real_path);
    }
    let seeds: Vec<String> = summary
        .modules
        .iter()
        .flat_map(|module| module.origin_requires_within(&ctx.config.dependency_dir))
        .map(str::to_string)
        .collect();

    let expand_started = Instant::now();
    let expanded = DependencyExpander::new(
        Arc::clone(&ctx.engine),
        Arc::clone(&ctx.runtime),
        &ctx.config.root,
    )
    .with_concurrency(ctx.config.concurrency)
    .expand(seeds, &visited)
    .await;
    tracing::debug!(
        "process {} files: {} modules in {:?}",
        ctx.config.dependency_dir,
        expanded.modules.len(),
        expand_started.elapsed()
    );
    errors.extend(expanded.errors);

    let set = ModuleSet::from_modules(summary.modules.into_iter().chain(expanded.modules));
    let export_modules: Vec<QueryPath> = ctx
        .config
        .export_modules
        .iter()
        .filter_map(|path| QueryPath::new(path).ok())
        .collect();
    let merged = merge(&set, &export_modules);

    errors.extend(emitter.emit_merged(&set, &merged, ctx.config.emit).await);
    if let Err(err) = emitter.emit_runtime().await {
        errors.push(err);
    }

    tracing::info!("file total {}", set.len());
    Ok(BuildReport {
        errors,
        total: set.len(),
        elapsed: started.elapsed(),
    })
}

/// Compile an entry and everything it requires into a list of module codes,
/// dependencies first and the entry last.
///
/// The entry's `code` and `wrap` come from the request; required modules are
/// read from disk and always wrapped. Remote references are left to the
/// loader. The first failure aborts the whole operation.
pub async fn all_in_one_code(ctx: &BuildContext, entry: TransformRequest) -> Result<Vec<String>> {
    let entry_path = entry.query_path.clone();
    let mut seen: FxHashSet<QueryPath> = FxHashSet::default();
    let mut pending: JoinSet<std::result::Result<ProcessedModule, TransformError>> =
        JoinSet::new();
    let mut modules = Vec::new();

    seen.insert(entry_path.clone());
    let engine = Arc::clone(&ctx.engine);
    pending.spawn(async move { engine.transform(entry).await });

    while let Some(joined) = pending.join_next().await {
        let module = match joined {
            Ok(Ok(module)) => module,
            Ok(Err(err)) => {
                pending.shutdown().await;
                return Err(err.into());
            }
            Err(e) => {
                pending.shutdown().await;
                return Err(BuildError::TransformFailure {
                    path: entry_path.to_string(),
                    message: e.to_string(),
                });
            }
        };

        for req in &module.requires {
            if req.is_remote() || !seen.insert(req.clone()) {
                continue;
            }
            let engine = Arc::clone(&ctx.engine);
            let request = TransformRequest::new(req.clone());
            pending.spawn(async move { engine.transform(request).await });
        }
        modules.push(module);
    }

    let set = ModuleSet::from_modules(modules);
    let Some(start) = set.idx_of(&entry_path) else {
        return Ok(Vec::new());
    };
    Ok(dependency_first(&set, start, |_| true)
        .into_iter()
        .map(|idx| set.get(idx).output_code().to_string())
        .collect())
}
