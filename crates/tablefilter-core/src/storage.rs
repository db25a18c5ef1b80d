//! Filesystem abstraction consumed by the path filter.
//!
//! The filter never talks to a concrete filesystem directly. Everything it
//! needs (listing a directory, stat-ing a path, reading a small metadata
//! file) goes through the [`FileSystem`] trait, and the handle itself is
//! produced by a [`FileSystemProvider`] from a [`StorageConfig`]. Remote
//! clients bring their own retry and consistency semantics; implementations
//! must surface failures instead of retrying internally.
//!
//! Two backends ship with the crate:
//!
//! - [`LocalFileSystem`] on top of `tokio::fs`, optionally rooted under a
//!   local directory (see [`StorageConfig::root`]).
//! - [`MemoryFileSystem`], an in-process tree with operation counters and
//!   failure injection, used by tests and embedders.

mod error;
pub mod local;
pub mod memory;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::{BackendError, StorageError};
pub use local::{LocalFileSystem, LocalFileSystemProvider};
pub use memory::{MemoryFileSystem, OpCounts};

use crate::path::TablePath;

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared handle to an opened filesystem.
pub type FileSystemRef = Arc<dyn FileSystem>;

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

/// Result of `stat` or one entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Absolute, normalized path of the entry.
    pub path: TablePath,
    /// File or directory.
    pub kind: FileKind,
    /// Length in bytes (0 for directories).
    pub len: u64,
}

impl FileStatus {
    /// Whether the entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// Whether the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// Settings handed to [`FileSystemProvider::open`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Local directory that table paths are resolved under.
    ///
    /// With `root = /srv/lake`, the table path `/warehouse/t1` maps to
    /// `/srv/lake/warehouse/t1`. When unset, table paths are used as-is.
    pub root: Option<PathBuf>,
}

/// Minimal filesystem client used by the filter and its collaborators.
#[async_trait]
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// List the immediate children of `dir`, sorted by path.
    ///
    /// A missing directory is `StorageError::NotFound`.
    async fn list_dir(&self, dir: &TablePath) -> StorageResult<Vec<FileStatus>>;

    /// Stat a single path. A missing path is `StorageError::NotFound`.
    async fn stat(&self, path: &TablePath) -> StorageResult<FileStatus>;

    /// Read a whole (small) file as UTF-8.
    async fn read_to_string(&self, path: &TablePath) -> StorageResult<String>;
}

/// Factory for filesystem handles.
#[async_trait]
pub trait FileSystemProvider: Send + Sync + fmt::Debug {
    /// Open a filesystem client for the given configuration.
    async fn open(&self, config: &StorageConfig) -> StorageResult<FileSystemRef>;
}

/// `stat` that reports a missing path as `Ok(None)`.
pub async fn stat_opt(fs: &dyn FileSystem, path: &TablePath) -> StorageResult<Option<FileStatus>> {
    match fs.stat(path).await {
        Ok(status) => Ok(Some(status)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
