//! The `CubeConfig` struct and its defaults.
//!
//! For file discovery and source layering, see the `discovery` module.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result};

/// How a smart build writes the merged module graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// One output file per module, mirroring the source tree.
    #[default]
    Modules,
    /// One concatenated file per root plus a common bundle.
    Bundles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeConfig {
    /// Project root; query paths are computed relative to it.
    pub root: PathBuf,

    /// Output directory. Required for directory-wide builds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<PathBuf>,

    /// Root-relative directory holding third-party packages.
    pub dependency_dir: String,

    /// Modules that should become bundle roots even when something requires them.
    pub export_modules: Vec<String>,

    /// Maximum number of dependency seeds expanded at once.
    pub concurrency: usize,

    /// Bound on concurrent file visits during a walk; unbounded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub walk_concurrency: Option<usize>,

    pub emit: EmitMode,

    /// Query path of the common bundle in `bundles` mode.
    pub common_bundle: String,

    /// Replacement for the embedded loader written as `cube.js`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_asset: Option<PathBuf>,

    /// Gitignore-style patterns for files left out of the build entirely.
    pub ignore: Vec<String>,

    /// Gitignore-style patterns for files copied without transformation.
    pub skip: Vec<String>,
}

pub const DEFAULT_DEPENDENCY_DIR: &str = "node_modules";
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_COMMON_BUNDLE: &str = "/cube.common.js";

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            dest: None,
            dependency_dir: DEFAULT_DEPENDENCY_DIR.to_string(),
            export_modules: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            walk_concurrency: None,
            emit: EmitMode::default(),
            common_bundle: DEFAULT_COMMON_BUNDLE.to_string(),
            runtime_asset: None,
            ignore: Vec::new(),
            skip: Vec::new(),
        }
    }
}

impl CubeConfig {
    /// Create a config for `root` with every other field defaulted.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Create from a `serde_json::Value`, e.g. the `cube` field of a
    /// `package.json`.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// The dependency directory as a rooted prefix, e.g. `/node_modules`.
    pub fn dependency_prefix(&self) -> String {
        format!("/{}", self.dependency_dir.trim_matches('/'))
    }

    /// Resolve relative `root`, `dest` and `runtime_asset` against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let absolutize = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else if path == Path::new(".") {
                base.to_path_buf()
            } else {
                base.join(path)
            }
        };

        self.root = absolutize(self.root);
        self.dest = self.dest.map(absolutize);
        self.runtime_asset = self.runtime_asset.map(absolutize);
        self
    }
}
