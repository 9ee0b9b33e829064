use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::enums::Emit;

/// Available cube subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build every file of a project into a destination directory
    ///
    /// By default every file is compiled or copied, third-party packages
    /// included. With --smart, the dependency directory is skipped and only
    /// the packages the application requires are compiled, then merged.
    Build(BuildArgs),

    /// Build a single file
    ///
    /// Writes the compiled module under --dest when given, otherwise prints
    /// it to stdout.
    File(FileArgs),

    /// Print an entry and everything it requires as one bundle
    Bundle(BundleArgs),

    /// Validate the project configuration
    Check(CheckArgs),
}

/// Arguments for the build command
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Project root (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output directory
    #[arg(short = 'o', long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Compile only the third-party files the application requires, then
    /// merge the module graph
    #[arg(long)]
    pub smart: bool,

    /// Output layout for smart builds
    #[arg(long, value_enum, requires = "smart")]
    pub emit: Option<Emit>,

    /// Module that must become a bundle root, e.g. /lib/entry.js (repeatable)
    #[arg(long = "export", value_name = "QUERY_PATH")]
    pub export_modules: Vec<String>,

    /// Maximum number of dependency packages expanded at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Explicit config file (cube.toml or package.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the file command
#[derive(Args, Debug, Default)]
pub struct FileArgs {
    /// File to build
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Project root (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output directory
    #[arg(short = 'o', long, value_name = "DIR")]
    pub dest: Option<PathBuf>,
}

/// Arguments for the bundle command
#[derive(Args, Debug, Default)]
pub struct BundleArgs {
    /// Entry query path, e.g. /src/app.js
    #[arg(value_name = "QUERY_PATH")]
    pub entry: String,

    /// Project root (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Write the entry without the loader wrapper
    #[arg(long)]
    pub ignore_first_code_wrap: bool,

    /// Write the bundle to a file instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Project root (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Explicit config file (cube.toml or package.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
