//! `cube file`: build one file.

use std::io::Write;

use cube_bundler::pipeline;

use crate::cli::FileArgs;
use crate::commands::context;
use crate::config;
use crate::error::{CliError, Result};
use crate::ui;

pub async fn execute(args: FileArgs) -> Result<()> {
    let mut config = config::load(args.root.as_deref(), None)?;
    if let Some(dest) = &args.dest {
        config.dest = Some(config::absolute(dest)?);
    }

    let file = config::absolute(&args.file)?;
    if !file.is_file() {
        return Err(CliError::FileNotFound(file));
    }
    if !file.starts_with(&config.root) {
        return Err(CliError::InvalidArgument(format!(
            "{} is outside the project root {}",
            file.display(),
            config.root.display()
        )));
    }

    let has_dest = config.dest.is_some();
    let ctx = context(config).await?;
    match pipeline::process_file(&ctx, &file).await? {
        Some(module) if !has_dest => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(module.output_code().as_bytes())?;
            stdout.write_all(b"\n")?;
        }
        Some(module) => ui::success(&format!("Built {}", module.query_path)),
        None => ui::success(&format!("Copied {}", file.display())),
    }
    Ok(())
}
