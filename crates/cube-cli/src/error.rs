//! Error handling for the cube CLI.
//!
//! Commands return [`CliError`]; `main` turns it into a miette report. Build
//! errors keep their own diagnostic codes and help text.

use std::path::PathBuf;

use miette::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Loading or validating the project config failed
    #[error("Configuration error: {0}")]
    Config(#[from] cube_config::ConfigError),

    /// A fatal build error
    #[error(transparent)]
    Build(#[from] cube_bundler::BuildError),

    /// The build finished but some files failed
    #[error("Build finished with {count} error(s)")]
    Incomplete { count: usize },

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Convert a CLI error into a miette report.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => Report::new(e),
        CliError::Config(cube_config::ConfigError::MissingDestination) => miette::miette!(
            help = "Pass --dest <DIR> or set `dest` in cube.toml",
            "No destination directory configured"
        ),
        CliError::Config(cube_config::ConfigError::NotFound) => miette::miette!(
            help = "Create a cube.toml or add a \"cube\" field to package.json",
            "Config file not found"
        ),
        CliError::Incomplete { count } => miette::miette!(
            help = "Errors are listed above; files that failed were not written",
            "Build finished with {count} error(s)"
        ),
        other => miette::miette!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_keep_their_diagnostic_code() {
        let report = cli_error_to_miette(CliError::Build(
            cube_bundler::BuildError::MissingDestination,
        ));
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("cube::missing_destination"));
    }

    #[test]
    fn incomplete_build_message() {
        let report = cli_error_to_miette(CliError::Incomplete { count: 3 });
        assert_eq!(report.to_string(), "Build finished with 3 error(s)");
        assert!(report.help().is_some());
    }

    #[test]
    fn config_errors_convert() {
        let err: CliError = cube_config::ConfigError::NotFound.into();
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().contains("config not found"));
    }
}
