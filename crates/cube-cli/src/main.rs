//! Cube CLI entry point: argument parsing, logging, command dispatch.

use clap::Parser;
use cube_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build::execute(build_args).await,
        cli::Command::File(file_args) => commands::file::execute(file_args).await,
        cli::Command::Bundle(bundle_args) => commands::bundle::execute(bundle_args).await,
        cli::Command::Check(check_args) => commands::check::execute(check_args),
    };

    result.map_err(error::cli_error_to_miette)
}
