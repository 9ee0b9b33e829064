//! Command-line interface definition for cube.
//!
//! - `cube build` - build a whole project tree
//! - `cube file` - build a single file
//! - `cube bundle` - print one entry and its dependencies as a single bundle
//! - `cube check` - validate the project configuration

mod commands;
pub mod enums;
mod tests;

use clap::Parser;

pub use commands::{BuildArgs, BundleArgs, CheckArgs, Command, FileArgs};
pub use enums::*;

/// Cube - build script, style and template trees
#[derive(Parser, Debug)]
#[command(
    name = "cube",
    version,
    about = "Build script, style and template trees into deployable output",
    long_about = "Cube compiles a source tree of scripts, stylesheets and templates into an\n\
                  output tree of loader-wrapped modules. Third-party packages are compiled\n\
                  only when the application actually requires them."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
