//! `cube build`: whole-project builds.

use std::time::Instant;

use cube_bundler::pipeline;

use crate::cli::BuildArgs;
use crate::commands::context;
use crate::config;
use crate::error::{CliError, Result};
use crate::ui;

/// 1. Load config (flags > env > file > defaults) and validate it
/// 2. Walk, transform and emit, fully or in smart mode
/// 3. Print every recoverable error and the totals
///
/// Fails with [`CliError::Incomplete`] when any file failed.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let started = Instant::now();
    let config = config::load_for_build(&args)?;
    config.validate()?;

    let dest = config.dest.clone().unwrap_or_default();
    ui::info(&format!(
        "Building {} -> {}{}",
        config.root.display(),
        dest.display(),
        if args.smart { " (smart)" } else { "" }
    ));

    let ctx = context(config).await?;
    let report = if args.smart {
        pipeline::process_dir_smart(&ctx).await?
    } else {
        pipeline::process_dir(&ctx).await?
    };

    ui::print_report(&report);
    tracing::debug!("build command took {}", ui::format_duration(started.elapsed()));

    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::Incomplete {
            count: report.errors.len(),
        })
    }
}
