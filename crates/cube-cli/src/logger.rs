//! Logging setup for the cube CLI.
//!
//! The filter level comes from, in order:
//! 1. `--verbose`: DEBUG for cube crates
//! 2. `--quiet`: ERROR only
//! 3. `RUST_LOG`
//! 4. INFO for cube crates
//!
//! ```rust,no_run
//! use cube_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("[transfer script]: src/app.js");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "cube_cli=debug,cube_bundler=debug,cube_config=debug,cube_graph=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "cube_cli=info,cube_bundler=info,cube_config=info,cube_graph=info";

/// Build the filter for the given verbosity flags.
pub fn env_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global tracing subscriber. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(env_filter(verbose, quiet), no_color);
}

pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
