//! Transform Engine contract and the standard engine.
//!
//! The walker and expander only see [`TransformEngine`]: give it a query path,
//! get back a [`ProcessedModule`] or a [`TransformError`]. [`StandardEngine`]
//! is the built-in implementation, dispatching on file extension to one
//! [`Processor`] per module type.

mod engine;
mod processors;
mod registry;
mod resolve;

pub use engine::StandardEngine;
pub use processors::{
    Processor, ScriptProcessor, SourceUnit, StyleProcessor, TemplateProcessor, extract_requires,
    wrap_module,
};
pub use registry::ExtensionRegistry;
pub use resolve::{Resolution, ResolutionKind, Resolver};

use async_trait::async_trait;
use cube_graph::{ProcessedModule, QueryPath};
use thiserror::Error;

/// One unit of work for a transform engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    pub query_path: QueryPath,
    /// Root-relative on-disk path of the source.
    pub real_path: String,
    /// In-memory source; when set, nothing is read from disk.
    pub code: Option<String>,
    /// `false` asks for a module emitted without the loader wrapper.
    pub wrap: bool,
}

impl TransformRequest {
    pub fn new(query_path: QueryPath) -> Self {
        let real_path = query_path.without_scheme().to_string();
        Self {
            query_path,
            real_path,
            code: None,
            wrap: true,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// No transform is registered for the file's extension.
    #[error("unknown file type: {path}")]
    UnknownType { path: String },

    #[error("{path}: {message}")]
    Failed { path: String, message: String },
}

impl TransformError {
    pub fn path(&self) -> &str {
        match self {
            Self::UnknownType { path } | Self::Failed { path, .. } => path,
        }
    }
}

/// Compiles one source file into a [`ProcessedModule`].
#[async_trait]
pub trait TransformEngine: Send + Sync {
    async fn transform(
        &self,
        request: TransformRequest,
    ) -> Result<ProcessedModule, TransformError>;
}
