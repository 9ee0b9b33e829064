//! # cube-graph
//!
//! Pure data structures for cube's module graph.
//!
//! This crate holds the processed-module model and the graph merger that
//! partitions a flat module set into per-root bundles. It performs no I/O:
//! modules come in already compiled, and the merger only reads their
//! `query_path` and `requires` fields.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ModuleSet                    │
//! │  (arena of ProcessedModule, QueryPath index) │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!                        ▼
//!              ┌───────────────────┐
//!              │ merge()           │
//!              │  RootMarks (per   │
//!              │  call, dropped)   │
//!              └─────────┬─────────┘
//!                        │
//!                        ▼
//!        MergeResult { bundles, common }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use cube_graph::{ModuleSet, ModuleType, ProcessedModule, QueryPath, merge};
//!
//! # fn main() -> Result<(), cube_graph::GraphError> {
//! let app = QueryPath::new("/app.js")?;
//! let util = QueryPath::new("/util.js")?;
//!
//! let set: ModuleSet = [
//!     ProcessedModule::builder(app.clone(), ModuleType::Script)
//!         .requires(vec![util.clone()])
//!         .build(),
//!     ProcessedModule::builder(util.clone(), ModuleType::Script).build(),
//! ]
//! .into_iter()
//! .collect();
//!
//! let result = merge(&set, &[]);
//! assert_eq!(result.bundle(&app).unwrap().modules, vec![util, app]);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub mod graph;
pub mod merge;
pub mod module;
pub mod query_path;

pub use graph::{ModuleIdx, ModuleSet};
pub use merge::{
    Bundle, MergeResult, RootMarks, dependency_first, find_roots, mark_roots, merge,
};
pub use module::{ModuleType, ProcessedModule, ProcessedModuleBuilder};
pub use query_path::{QueryPath, QueryPathError};

/// Errors raised while assembling a module set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// A module with the same query path is already in the set.
    #[error("module {query_path} is already in the set")]
    DuplicateModule { query_path: QueryPath },

    #[error(transparent)]
    InvalidQueryPath(#[from] QueryPathError),
}

#[cfg(test)]
mod tests;
