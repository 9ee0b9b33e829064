//! # cube-bundler
//!
//! Concurrent module discovery, transformation and emission for cube builds.
//!
//! ## Data flow
//!
//! ```text
//!  source tree ──▶ Walker ──┐                          ┌──▶ per-module files
//!                           ├──▶ ModuleSet ──▶ merge ──┤
//!  /node_modules ◀─ Expander┘   (cube-graph)           └──▶ per-root bundles
//!  (seeds from requires_origin)                              + cube.js runtime
//! ```
//!
//! The walker visits the primary tree with the dependency directory pruned;
//! the expander compiles only the third-party files that something reachable
//! actually requires. Both feed one flat module set that the graph merger
//! partitions before the emitter writes it out.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cube_bundler::{BuildContext, NativeRuntime, pipeline};
//! use cube_config::CubeConfig;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CubeConfig::new("/srv/app").with_dest("/srv/app/dist");
//! let ctx = BuildContext::from_config(config, Arc::new(NativeRuntime)).await?;
//!
//! let report = pipeline::process_dir_smart(&ctx).await?;
//! println!("{} files in {}s", report.total, report.elapsed_seconds());
//! # Ok(()) }
//! ```

use std::path::PathBuf;

use miette::Diagnostic;

pub mod classifier;
pub mod emitter;
pub mod expander;
pub mod pipeline;
pub mod report;
pub mod runtime;
pub mod transform;
pub mod walker;

pub use classifier::{Classification, FileClassifier, IgnoreRules};
pub use emitter::Emitter;
pub use expander::{DependencyExpander, ExpandOutcome, VisitedSet};
pub use pipeline::{BuildContext, DirVisitor, VisitMode};
pub use report::BuildReport;
pub use runtime::{EntryKind, FileMetadata, NativeRuntime, Runtime, RuntimeError, RuntimeResult};
pub use transform::{StandardEngine, TransformEngine, TransformError, TransformRequest};
pub use walker::{FileVisitor, VisitOutcome, WalkSummary, WalkedFile, Walker};

pub use cube_config::EmitMode;
pub use cube_graph::{Bundle, MergeResult, ModuleSet, ModuleType, ProcessedModule, QueryPath};

/// Error types for cube build operations.
#[derive(Debug, Clone, thiserror::Error, Diagnostic)]
pub enum BuildError {
    /// No transform mapping for the file's extension.
    #[error("unknown file type: {path}")]
    #[diagnostic(code(cube::unknown_file_type))]
    UnknownFileType { path: String },

    /// The transform engine rejected a file.
    #[error("failed to transform {path}: {message}")]
    #[diagnostic(
        code(cube::transform_failure),
        help("Fix the source file, or list it under [skip] to copy it as-is")
    )]
    TransformFailure { path: String, message: String },

    /// Writing an output file failed.
    #[error("failed to write {path}: {message}")]
    #[diagnostic(code(cube::write_failure))]
    WriteFailure { path: String, message: String },

    /// A directory-wide build was started without a destination.
    #[error("no destination directory configured")]
    #[diagnostic(
        code(cube::missing_destination),
        help("Pass a destination directory or set `dest` in cube.toml")
    )]
    MissingDestination,

    /// Enumerating or reading part of the source tree failed.
    #[error("failed to read {}: {source}", path.display())]
    #[diagnostic(code(cube::walk))]
    Walk {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    /// An ignore/skip pattern could not be compiled.
    #[error("invalid ignore rule '{pattern}': {message}")]
    #[diagnostic(
        code(cube::invalid_rule),
        help("Check the patterns in .cubeignore and the `ignore`/`skip` config lists")
    )]
    InvalidRule { pattern: String, message: String },
}

/// Result type alias for cube-bundler operations.
pub type Result<T> = std::result::Result<T, BuildError>;

impl BuildError {
    /// The root-relative file this error is about, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            BuildError::UnknownFileType { path }
            | BuildError::TransformFailure { path, .. }
            | BuildError::WriteFailure { path, .. } => Some(path),
            BuildError::Walk { path, .. } => path.to_str(),
            BuildError::MissingDestination | BuildError::InvalidRule { .. } => None,
        }
    }
}

impl From<TransformError> for BuildError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::UnknownType { path } => BuildError::UnknownFileType { path },
            TransformError::Failed { path, message } => {
                BuildError::TransformFailure { path, message }
            }
        }
    }
}
