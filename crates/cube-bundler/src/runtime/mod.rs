//! Filesystem boundary for cube builds.
//!
//! The walker, expander, resolver and emitter reach the disk only through
//! [`Runtime`]. Tests swap in stub runtimes; [`NativeRuntime`] is the real one.

pub mod native;

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use native::NativeRuntime;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// The blocking task serving the call was cancelled or panicked.
    #[error("filesystem task interrupted: {0}")]
    Interrupted(String),
}

impl RuntimeError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Sockets, fifos and the like. The walker leaves them alone.
    Other,
}

#[derive(Debug, Clone, Copy)]
pub struct FileMetadata {
    pub kind: EntryKind,
    pub len: u64,
}

impl FileMetadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Write `content` to `path`, creating missing parent directories.
    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()>;

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    fn exists(&self, path: &Path) -> bool;

    /// Names of the entries of a directory, in no particular order.
    async fn read_dir(&self, path: &Path) -> RuntimeResult<Vec<String>>;
}
