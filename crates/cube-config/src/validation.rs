//! Config validation
//!
//! Schema checks need no filesystem; [`validate_fs`] additionally checks what a
//! directory-wide build requires before any work starts.

use crate::config::CubeConfig;
use crate::error::{ConfigError, Result};

/// Schema-only validation (no filesystem checks).
pub fn validate_schema(config: &CubeConfig) -> Result<()> {
    if config.concurrency == 0 {
        return Err(ConfigError::invalid(
            "concurrency",
            "Use a concurrency of at least 1",
        ));
    }

    if config.walk_concurrency == Some(0) {
        return Err(ConfigError::invalid(
            "walk_concurrency",
            "Remove walk_concurrency for an unbounded walk, or set it to at least 1",
        ));
    }

    if config.dependency_dir.trim_matches('/').is_empty() {
        return Err(ConfigError::invalid(
            "dependency_dir",
            "Name the directory holding third-party packages, e.g. \"node_modules\"",
        ));
    }

    if !config.common_bundle.ends_with(".js") {
        return Err(ConfigError::invalid(
            "common_bundle",
            "The common bundle must be a .js query path",
        ));
    }

    for pattern in config.ignore.iter().chain(&config.skip) {
        if pattern.trim().is_empty() {
            return Err(ConfigError::invalid(
                "ignore",
                "Remove empty strings from the 'ignore' and 'skip' arrays",
            ));
        }
    }

    Ok(())
}

/// Validation for directory-wide builds: schema, a destination, and an
/// existing source root.
pub fn validate_fs(config: &CubeConfig) -> Result<()> {
    validate_schema(config)?;

    if config.dest.is_none() {
        return Err(ConfigError::MissingDestination);
    }

    if !config.root.is_dir() {
        return Err(ConfigError::RootNotFound(config.root.clone()));
    }

    if let Some(asset) = &config.runtime_asset {
        if !asset.is_file() {
            return Err(ConfigError::invalid(
                "runtime_asset",
                format!("{} does not exist", asset.display()),
            ));
        }
    }

    Ok(())
}

impl CubeConfig {
    pub fn validate(&self) -> Result<()> {
        validate_fs(self)
    }
}
