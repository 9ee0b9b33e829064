//! `cube check`: load and validate the project config without building.

use crate::cli::CheckArgs;
use crate::config;
use crate::error::Result;
use crate::ui;

pub fn execute(args: CheckArgs) -> Result<()> {
    let config = config::load(args.root.as_deref(), args.config.as_deref())?;
    cube_config::validate_schema(&config)?;

    ui::success(&format!("Config for {} is valid", config.root.display()));
    match &config.dest {
        Some(dest) => ui::info(&format!("dest: {}", dest.display())),
        None => ui::warning("no dest configured; `cube build` will need --dest"),
    }
    ui::info(&format!(
        "dependency dir: {}, concurrency: {}, emit: {:?}",
        config.dependency_dir, config.concurrency, config.emit
    ));
    Ok(())
}
