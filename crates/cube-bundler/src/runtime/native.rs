//! `std::fs` behind the [`Runtime`] trait, on tokio's blocking pool.

// The only module allowed to call std::fs
#![allow(clippy::disallowed_methods)]

use std::fs;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::task;

use super::{EntryKind, FileMetadata, Runtime, RuntimeError, RuntimeResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    pub fn new() -> Self {
        Self
    }
}

/// Run a blocking filesystem call for `path` off the async workers.
async fn blocking<T, F>(path: &Path, op: F) -> RuntimeResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> io::Result<T> + Send + 'static,
{
    let path = path.to_path_buf();
    task::spawn_blocking(move || op(&path).map_err(|err| RuntimeError::from_io(&path, err)))
        .await
        .map_err(|err| RuntimeError::Interrupted(err.to_string()))?
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        blocking(path, |path| fs::read(path)).await
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        let content = content.to_vec();
        blocking(path, move |path| {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)
        })
        .await
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        blocking(path, |path| {
            let meta = fs::metadata(path)?;
            let kind = if meta.is_dir() {
                EntryKind::Dir
            } else if meta.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            Ok(FileMetadata {
                kind,
                len: meta.len(),
            })
        })
        .await
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    async fn read_dir(&self, path: &Path) -> RuntimeResult<Vec<String>> {
        blocking(path, |path| {
            let mut names = Vec::new();
            for entry in fs::read_dir(path)? {
                match entry?.file_name().into_string() {
                    Ok(name) => names.push(name),
                    Err(raw) => tracing::warn!(
                        "skipping non UTF-8 entry {:?} in {}",
                        raw,
                        path.display()
                    ),
                }
            }
            Ok(names)
        })
        .await
    }
}
