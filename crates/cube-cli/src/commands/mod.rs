//! Subcommand implementations.

pub mod build;
pub mod bundle;
pub mod check;
pub mod file;

use std::sync::Arc;

use cube_bundler::{BuildContext, NativeRuntime};
use cube_config::CubeConfig;

use crate::error::Result;

/// Build context over the native filesystem.
pub(crate) async fn context(config: CubeConfig) -> Result<BuildContext> {
    Ok(BuildContext::from_config(config, Arc::new(NativeRuntime::new())).await?)
}
