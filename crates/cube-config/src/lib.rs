//! Configuration for cube builds.
//!
//! [`CubeConfig`] is plain serde data. [`ConfigDiscovery`] finds `cube.toml`
//! (or the `cube` field of `package.json`) and layers it over the defaults and
//! under `CUBE_*` environment variables.

pub mod config;
pub mod discovery;
pub mod error;
pub mod validation;

pub use config::*;
pub use error::*;

pub use discovery::ConfigDiscovery;
pub use validation::{validate_fs, validate_schema};
