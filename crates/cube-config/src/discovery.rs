//! File-based config discovery for CLI use
//!
//! Finds the project's cube configuration and layers it with figment:
//! defaults, then the config file, then `CUBE_*` environment variables.

// Runs before a build runtime exists
#![allow(clippy::disallowed_methods)]

use std::fs;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde_json::Value;

use crate::config::CubeConfig;
use crate::error::{ConfigError, Result};

pub const CONFIG_FILE: &str = "cube.toml";
pub const PACKAGE_JSON: &str = "package.json";
pub const PACKAGE_FIELD: &str = "cube";
pub const ENV_PREFIX: &str = "CUBE_";

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use cube_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// let config = discovery.load_or_default().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. cube.toml
    /// 2. package.json (cube field)
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join(CONFIG_FILE);
        if toml_path.exists() {
            return Some(toml_path);
        }

        let pkg_path = self.root.join(PACKAGE_JSON);
        if pkg_path.exists() {
            if let Ok(content) = fs::read_to_string(&pkg_path) {
                if let Ok(parsed) = serde_json::from_str::<Value>(&content) {
                    if parsed.get(PACKAGE_FIELD).is_some_and(|v| !v.is_null()) {
                        return Some(pkg_path);
                    }
                }
            }
        }

        None
    }

    /// Load config from the discovered file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no config file is found.
    pub fn load(&self) -> Result<CubeConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        self.load_from(&path)
    }

    /// Like [`load`](Self::load), but falls back to defaults (plus
    /// environment) when the project has no config file.
    pub fn load_or_default(&self) -> Result<CubeConfig> {
        match self.find() {
            Some(path) => self.load_from(&path),
            None => {
                tracing::debug!("no cube config in {}, using defaults", self.root.display());
                self.extract(self.base())
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from(&self, path: &Path) -> Result<CubeConfig> {
        tracing::debug!("loading config from {}", path.display());

        let figment = if path.file_name() == Some(std::ffi::OsStr::new(PACKAGE_JSON)) {
            self.base()
                .merge(Serialized::defaults(self.package_json_section(path)?))
        } else {
            self.base().merge(Toml::file_exact(path))
        };

        self.extract(figment)
    }

    fn base(&self) -> Figment {
        Figment::new().merge(Serialized::defaults(CubeConfig::default()))
    }

    fn extract(&self, figment: Figment) -> Result<CubeConfig> {
        let config: CubeConfig = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ConfigError::InvalidValue {
                field: "configuration".to_string(),
                hint: Some(e.to_string()),
            })?;

        Ok(config.resolve_paths(&self.root))
    }

    fn package_json_section(&self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;

        let parsed: Value = serde_json::from_str(&content).map_err(|e| {
            ConfigError::invalid(PACKAGE_JSON, format!("Invalid JSON: {e}"))
        })?;

        match parsed.get(PACKAGE_FIELD) {
            Some(value) if value.is_object() => Ok(value.clone()),
            Some(_) => Err(ConfigError::invalid(
                PACKAGE_FIELD,
                "The 'cube' field must be an object",
            )),
            None => Err(ConfigError::invalid(
                PACKAGE_FIELD,
                "Add a 'cube' field to your package.json",
            )),
        }
    }
}
