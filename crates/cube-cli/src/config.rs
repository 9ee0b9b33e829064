//! Project config loading for CLI commands.
//!
//! Priority: CLI flags > `CUBE_*` environment > config file > defaults. The
//! file and environment layers come from [`ConfigDiscovery`]; flags are
//! applied on top here.

use std::path::{Path, PathBuf};

use cube_config::{ConfigDiscovery, CubeConfig};

use crate::cli::BuildArgs;
use crate::error::{CliError, Result};

/// Absolute form of a user-supplied path, relative to the working directory.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(CliError::Io)
}

/// The project directory: the given one, or the working directory.
pub fn project_dir(root: Option<&Path>) -> Result<PathBuf> {
    match root {
        Some(root) => absolute(root),
        None => std::env::current_dir().map_err(CliError::Io),
    }
}

/// Load the config of the project at `root`, from `config_file` when given.
pub fn load(root: Option<&Path>, config_file: Option<&Path>) -> Result<CubeConfig> {
    let dir = project_dir(root)?;
    if !dir.is_dir() {
        return Err(CliError::Config(cube_config::ConfigError::RootNotFound(dir)));
    }

    let discovery = ConfigDiscovery::new(&dir);
    let config = match config_file {
        Some(file) => discovery.load_from(&absolute(file)?)?,
        None => discovery.load_or_default()?,
    };
    tracing::debug!("project root {}", config.root.display());
    Ok(config)
}

/// Load the project config and apply the build flags over it.
pub fn load_for_build(args: &BuildArgs) -> Result<CubeConfig> {
    let config = load(args.root.as_deref(), args.config.as_deref())?;
    apply_build_args(config, args)
}

pub fn apply_build_args(mut config: CubeConfig, args: &BuildArgs) -> Result<CubeConfig> {
    if let Some(dest) = &args.dest {
        config.dest = Some(absolute(dest)?);
    }
    if let Some(emit) = args.emit {
        config.emit = emit.into();
    }
    if !args.export_modules.is_empty() {
        config.export_modules = args.export_modules.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    Ok(config)
}
