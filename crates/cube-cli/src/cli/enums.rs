//! Value enums for CLI arguments.

use clap::ValueEnum;
use cube_config::EmitMode;

/// How a smart build writes the merged module graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// One output file per module
    Modules,
    /// One file per root plus a common bundle
    Bundles,
}

impl From<Emit> for EmitMode {
    fn from(emit: Emit) -> Self {
        match emit {
            Emit::Modules => EmitMode::Modules,
            Emit::Bundles => EmitMode::Bundles,
        }
    }
}
