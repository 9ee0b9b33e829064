use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use cube_config::CubeConfig;
use cube_graph::{ModuleType, ProcessedModule};
use rustc_hash::FxHashMap;

use super::processors::{Processor, ScriptProcessor, SourceUnit, StyleProcessor, TemplateProcessor};
use super::registry::ExtensionRegistry;
use super::resolve::Resolver;
use super::{TransformEngine, TransformError, TransformRequest};
use crate::Runtime;

/// Built-in engine: extension registry plus one processor per module type.
pub struct StandardEngine {
    registry: ExtensionRegistry,
    processors: FxHashMap<ModuleType, Arc<dyn Processor>>,
    resolver: Resolver,
}

impl StandardEngine {
    pub fn new(root: impl Into<PathBuf>, dependency_dir: &str, runtime: Arc<dyn Runtime>) -> Self {
        let mut engine = Self {
            registry: ExtensionRegistry::standard(),
            processors: FxHashMap::default(),
            resolver: Resolver::new(root, dependency_dir, runtime),
        };
        engine.register_processor(Arc::new(ScriptProcessor));
        engine.register_processor(Arc::new(StyleProcessor));
        engine.register_processor(Arc::new(TemplateProcessor));
        engine
    }

    pub fn from_config(config: &CubeConfig, runtime: Arc<dyn Runtime>) -> Self {
        Self::new(config.root.clone(), &config.dependency_dir, runtime)
    }

    /// Replace the processor for its module type.
    pub fn register_processor(&mut self, processor: Arc<dyn Processor>) -> &mut Self {
        self.processors.insert(processor.module_type(), processor);
        self
    }

    async fn read_source(&self, request: &TransformRequest) -> Result<String, TransformError> {
        if let Some(code) = &request.code {
            return Ok(code.clone());
        }

        let path = self.resolver.fs_path(&request.real_path);
        let bytes = self
            .resolver
            .runtime()
            .read_file(&path)
            .await
            .map_err(|e| TransformError::Failed {
                path: request.real_path.clone(),
                message: e.to_string(),
            })?;

        String::from_utf8(bytes).map_err(|_| TransformError::Failed {
            path: request.real_path.clone(),
            message: "source is not valid UTF-8".to_string(),
        })
    }
}

#[async_trait]
impl TransformEngine for StandardEngine {
    async fn transform(
        &self,
        request: TransformRequest,
    ) -> Result<ProcessedModule, TransformError> {
        let module_type = self
            .registry
            .lookup(&request.real_path)
            .ok_or_else(|| TransformError::UnknownType {
                path: request.real_path.clone(),
            })?;

        let processor = self.processors.get(&module_type).ok_or_else(|| {
            TransformError::UnknownType {
                path: request.real_path.clone(),
            }
        })?;

        let source = self.read_source(&request).await?;

        tracing::info!(
            "[transfer {}]: {}",
            module_type,
            request.real_path.trim_start_matches('/')
        );

        processor
            .process(SourceUnit {
                query_path: &request.query_path,
                real_path: &request.real_path,
                source,
                wrap: request.wrap,
                resolver: &self.resolver,
            })
            .await
    }
}
