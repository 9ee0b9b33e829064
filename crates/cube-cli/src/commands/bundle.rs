//! `cube bundle`: one entry plus its dependencies, dependency-first.

use cube_bundler::{BuildError, QueryPath, TransformRequest, pipeline};

use crate::cli::BundleArgs;
use crate::commands::context;
use crate::config;
use crate::error::{CliError, Result};
use crate::ui;

pub async fn execute(args: BundleArgs) -> Result<()> {
    let config = config::load(args.root.as_deref(), None)?;
    let entry = QueryPath::new(&args.entry)
        .map_err(|e| CliError::InvalidArgument(format!("entry '{}': {e}", args.entry)))?;

    let ctx = context(config).await?;
    let request = TransformRequest::new(entry).with_wrap(!args.ignore_first_code_wrap);
    let codes = pipeline::all_in_one_code(&ctx, request).await?;
    let bundle = codes.join("\n");

    match &args.output {
        Some(output) => {
            let output = config::absolute(output)?;
            ctx.runtime
                .write_file(&output, bundle.as_bytes())
                .await
                .map_err(|e| BuildError::WriteFailure {
                    path: output.display().to_string(),
                    message: e.to_string(),
                })?;
            ui::success(&format!(
                "Wrote {} modules to {}",
                codes.len(),
                output.display()
            ));
        }
        None => println!("{bundle}"),
    }
    Ok(())
}
