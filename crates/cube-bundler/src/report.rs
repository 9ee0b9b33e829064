use std::time::Duration;

use crate::BuildError;

/// Aggregate result of a directory-wide build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Recoverable per-file failures, in the order they settled.
    pub errors: Vec<BuildError>,
    /// Files copied or processed (ignored files excluded). For smart builds,
    /// the number of modules in the merged set.
    pub total: usize,
    pub elapsed: Duration,
}

impl BuildReport {
    /// Elapsed wall time in whole seconds, rounded up.
    pub fn elapsed_seconds(&self) -> u64 {
        let secs = self.elapsed.as_secs();
        if self.elapsed.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
