//! Writes build output under the destination directory.
//!
//! Every output path is derived from a root-relative module path, cleaned
//! with `path_clean` and checked to stay inside the destination. Writes go
//! through the [`Runtime`], which creates missing parent directories. Write
//! failures are not retried; they surface as [`BuildError::WriteFailure`].

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use cube_config::{CubeConfig, EmitMode};
use cube_graph::{MergeResult, ModuleSet, ModuleType, ProcessedModule};
use path_clean::PathClean;

use crate::{BuildError, Result, Runtime};

/// Loader shipped with every build unless `runtime_asset` overrides it.
pub const RUNTIME_FILE: &str = "cube.js";
/// Bundle layout written next to the bundles in `bundles` mode.
pub const BUNDLE_MANIFEST: &str = "cube.bundles.json";

const EMBEDDED_RUNTIME: &[u8] = include_bytes!("../assets/cube.js");

pub struct Emitter {
    runtime: Arc<dyn Runtime>,
    dest: PathBuf,
    runtime_asset: Option<PathBuf>,
    common_bundle: String,
}

impl Emitter {
    pub fn new(dest: impl Into<PathBuf>, runtime: Arc<dyn Runtime>) -> Self {
        Self {
            runtime,
            dest: dest.into().clean(),
            runtime_asset: None,
            common_bundle: cube_config::DEFAULT_COMMON_BUNDLE.to_string(),
        }
    }

    /// Build an emitter for `config.dest`.
    pub fn from_config(config: &CubeConfig, runtime: Arc<dyn Runtime>) -> Result<Self> {
        let dest = config.dest.as_ref().ok_or(BuildError::MissingDestination)?;
        Ok(Self::new(dest, runtime)
            .with_runtime_asset(config.runtime_asset.clone())
            .with_common_bundle(config.common_bundle.clone()))
    }

    pub fn with_runtime_asset(mut self, runtime_asset: Option<PathBuf>) -> Self {
        self.runtime_asset = runtime_asset;
        self
    }

    pub fn with_common_bundle(mut self, common_bundle: impl Into<String>) -> Self {
        self.common_bundle = common_bundle.into();
        self
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Destination file for a root-relative path.
    ///
    /// The relative part is cleaned on its own, so a relative `dest` such as
    /// `.` keeps working; only a path climbing above `dest` is rejected.
    pub fn dest_path(&self, rel_path: &str) -> Result<PathBuf> {
        let slashed = rel_path.replace('\\', "/");
        let rel = Path::new(slashed.trim_start_matches('/')).clean();
        let escapes = matches!(
            rel.components().next(),
            Some(Component::ParentDir | Component::RootDir | Component::Prefix(_))
        );
        if escapes {
            return Err(BuildError::WriteFailure {
                path: rel_path.to_string(),
                message: "path escapes the destination directory".to_string(),
            });
        }
        Ok(self.dest.join(rel))
    }

    /// Write one module at its query path.
    ///
    /// Style modules also get their raw CSS written next to the source path
    /// with a `.css` extension. For `.css` sources that is the module's own
    /// output path, so only the raw CSS is written there.
    pub async fn emit_module(&self, module: &ProcessedModule) -> Result<()> {
        let out = module.query_path.without_scheme();

        if module.module_type == ModuleType::Style {
            let css = with_css_extension(&module.real_path);
            if css != out {
                self.write(out, module.output_code().as_bytes()).await?;
            }
            return self.write(&css, module.code.as_bytes()).await;
        }

        self.write(out, module.output_code().as_bytes()).await
    }

    /// Write a merged module set according to `mode`.
    ///
    /// Every failure is collected; a failed write never stops the others.
    pub async fn emit_merged(
        &self,
        set: &ModuleSet,
        merged: &MergeResult,
        mode: EmitMode,
    ) -> Vec<BuildError> {
        let mut errors = Vec::new();
        match mode {
            EmitMode::Modules => {
                for query_path in merged.modules() {
                    if let Some(module) = set.get_by_path(query_path) {
                        tracing::info!("> gen code: {}", query_path.without_scheme());
                        if let Err(err) = self.emit_module(module).await {
                            errors.push(err);
                        }
                    }
                }
            }
            EmitMode::Bundles => {
                if let Some(common) = &merged.common {
                    let target = self.common_bundle.clone();
                    errors.extend(self.emit_bundle(set, &target, &common.modules).await);
                }
                for (root, bundle) in &merged.bundles {
                    if bundle.is_empty() {
                        continue;
                    }
                    errors.extend(
                        self.emit_bundle(set, root.without_scheme(), &bundle.modules)
                            .await,
                    );
                }
                if let Err(err) = self.emit_manifest(merged).await {
                    errors.push(err);
                }
            }
        }
        errors
    }

    /// Concatenate the modules of one bundle into `target`. Verbatim modules
    /// cannot be concatenated into script output and are written on their own.
    async fn emit_bundle(
        &self,
        set: &ModuleSet,
        target: &str,
        modules: &[cube_graph::QueryPath],
    ) -> Vec<BuildError> {
        let mut errors = Vec::new();
        let mut parts = Vec::with_capacity(modules.len());

        for query_path in modules {
            let Some(module) = set.get_by_path(query_path) else {
                continue;
            };
            if module.module_type == ModuleType::Verbatim {
                if let Err(err) = self.emit_module(module).await {
                    errors.push(err);
                }
                continue;
            }
            if module.module_type == ModuleType::Style {
                let css = with_css_extension(&module.real_path);
                if let Err(err) = self.write(&css, module.code.as_bytes()).await {
                    errors.push(err);
                }
                // A stylesheet that is its own root keeps the raw CSS.
                if css == target {
                    continue;
                }
            }
            parts.push(module.wrapped_code.as_str());
        }

        if parts.is_empty() {
            return errors;
        }

        tracing::info!("> gen code: {target} ({} modules)", parts.len());
        if let Err(err) = self.write(target, parts.join("\n").as_bytes()).await {
            errors.push(err);
        }
        errors
    }

    async fn emit_manifest(&self, merged: &MergeResult) -> Result<()> {
        let json = serde_json::to_vec_pretty(merged).map_err(|e| BuildError::WriteFailure {
            path: BUNDLE_MANIFEST.to_string(),
            message: e.to_string(),
        })?;
        self.write(BUNDLE_MANIFEST, &json).await
    }

    /// Write the loader runtime to `dest/cube.js`.
    pub async fn emit_runtime(&self) -> Result<()> {
        let content = match &self.runtime_asset {
            Some(asset) => {
                self.runtime
                    .read_file(asset)
                    .await
                    .map_err(|source| BuildError::Walk {
                        path: asset.clone(),
                        source,
                    })?
            }
            None => EMBEDDED_RUNTIME.to_vec(),
        };
        self.write(RUNTIME_FILE, &content).await
    }

    /// Byte-for-byte copy of `source` to the mirrored `rel_path`.
    pub async fn copy(&self, from: &Path, rel_path: &str) -> Result<()> {
        let content = self
            .runtime
            .read_file(from)
            .await
            .map_err(|source| BuildError::Walk {
                path: from.to_path_buf(),
                source,
            })?;
        self.write(rel_path, &content).await
    }

    async fn write(&self, rel_path: &str, content: &[u8]) -> Result<()> {
        let target = self.dest_path(rel_path)?;
        self.runtime
            .write_file(&target, content)
            .await
            .map_err(|e| BuildError::WriteFailure {
                path: rel_path.to_string(),
                message: e.to_string(),
            })
    }
}

/// `/a/b.less` -> `/a/b.css`; paths without an extension get one appended.
pub fn with_css_extension(path: &str) -> String {
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => format!("{}.css", &path[..file_start + dot]),
        _ => format!("{path}.css"),
    }
}
