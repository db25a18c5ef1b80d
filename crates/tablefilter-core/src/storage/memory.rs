//! In-memory filesystem backend.
//!
//! Directories are implicit: writing `/a/b/f` makes `/`, `/a` and `/a/b`
//! directories. Every trait operation bumps a counter so callers can assert
//! how much I/O a piece of code performed, and individual paths can be
//! poisoned to simulate transient backend failures.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::path::TablePath;
use crate::storage::{
    BackendError, FileKind, FileStatus, FileSystem, FileSystemProvider, FileSystemRef,
    StorageConfig, StorageError, StorageResult,
};

/// Snapshot of the per-operation counters of a [`MemoryFileSystem`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    /// `list_dir` calls.
    pub list: u64,
    /// `stat` calls.
    pub stat: u64,
    /// `read_to_string` calls.
    pub read: u64,
    /// `FileSystemProvider::open` calls.
    pub open: u64,
}

impl OpCounts {
    /// Total number of filesystem reads (list + stat + read).
    pub fn reads(&self) -> u64 {
        self.list + self.stat + self.read
    }
}

#[derive(Debug, Default)]
struct Counters {
    list: AtomicU64,
    stat: AtomicU64,
    read: AtomicU64,
    open: AtomicU64,
}

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<TablePath, String>,
    dirs: BTreeSet<TablePath>,
    failing: HashSet<TablePath>,
}

impl Tree {
    fn add_dirs(&mut self, dir: &TablePath) {
        let mut current = Some(dir.clone());
        while let Some(d) = current {
            current = d.parent();
            self.dirs.insert(d);
        }
    }

    fn is_dir(&self, path: &TablePath) -> bool {
        path.is_root() || self.dirs.contains(path)
    }
}

#[derive(Debug, Default)]
struct Inner {
    tree: RwLock<Tree>,
    counters: Counters,
}

/// Cheaply cloneable in-memory filesystem; clones share the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    inner: Arc<Inner>,
}

fn memory_err(path: &TablePath, kind: io::ErrorKind, msg: &str) -> StorageError {
    StorageError::from_backend(
        path.to_string(),
        BackendError::Memory(io::Error::new(kind, msg.to_string())),
    )
}

impl MemoryFileSystem {
    /// Create an empty filesystem containing only `/`.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tree<R>(&self, f: impl FnOnce(&Tree) -> R) -> R {
        let tree = self
            .inner
            .tree
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&tree)
    }

    fn with_tree_mut<R>(&self, f: impl FnOnce(&mut Tree) -> R) -> R {
        let mut tree = self
            .inner
            .tree
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut tree)
    }

    /// Create or replace a file, creating parent directories.
    pub fn put_file(&self, path: &TablePath, contents: impl Into<String>) {
        let contents = contents.into();
        self.with_tree_mut(|tree| {
            if let Some(parent) = path.parent() {
                tree.add_dirs(&parent);
            }
            tree.files.insert(path.clone(), contents);
        });
    }

    /// Create a directory and all of its ancestors.
    pub fn create_dir(&self, path: &TablePath) {
        self.with_tree_mut(|tree| tree.add_dirs(path));
    }

    /// Remove a file; returns whether it existed.
    pub fn remove_file(&self, path: &TablePath) -> bool {
        self.with_tree_mut(|tree| tree.files.remove(path).is_some())
    }

    /// Make every operation that targets `path` fail with an I/O error.
    pub fn fail_path(&self, path: &TablePath) {
        self.with_tree_mut(|tree| {
            tree.failing.insert(path.clone());
        });
    }

    /// Undo all [`fail_path`](Self::fail_path) injections.
    pub fn clear_failures(&self) {
        self.with_tree_mut(|tree| tree.failing.clear());
    }

    /// Current operation counters.
    pub fn op_counts(&self) -> OpCounts {
        let c = &self.inner.counters;
        OpCounts {
            list: c.list.load(Ordering::Relaxed),
            stat: c.stat.load(Ordering::Relaxed),
            read: c.read.load(Ordering::Relaxed),
            open: c.open.load(Ordering::Relaxed),
        }
    }

    /// Reset all operation counters to zero.
    pub fn reset_op_counts(&self) {
        let c = &self.inner.counters;
        c.list.store(0, Ordering::Relaxed);
        c.stat.store(0, Ordering::Relaxed);
        c.read.store(0, Ordering::Relaxed);
        c.open.store(0, Ordering::Relaxed);
    }

    fn check_failure(tree: &Tree, path: &TablePath) -> StorageResult<()> {
        if tree.failing.contains(path) {
            return Err(memory_err(
                path,
                io::ErrorKind::ConnectionReset,
                "injected failure",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn list_dir(&self, dir: &TablePath) -> StorageResult<Vec<FileStatus>> {
        self.inner.counters.list.fetch_add(1, Ordering::Relaxed);
        self.with_tree(|tree| {
            Self::check_failure(tree, dir)?;

            if !tree.is_dir(dir) {
                if tree.files.contains_key(dir) {
                    return Err(memory_err(dir, io::ErrorKind::NotADirectory, "not a directory"));
                }
                return Err(memory_err(dir, io::ErrorKind::NotFound, "no such directory"));
            }

            let is_child = |p: &TablePath| p.parent().as_ref() == Some(dir);

            let mut out: Vec<FileStatus> = tree
                .dirs
                .iter()
                .filter(|p| is_child(*p))
                .map(|p| FileStatus {
                    path: p.clone(),
                    kind: FileKind::Directory,
                    len: 0,
                })
                .chain(
                    tree.files
                        .iter()
                        .filter(|(p, _)| is_child(*p))
                        .map(|(p, contents)| FileStatus {
                            path: p.clone(),
                            kind: FileKind::File,
                            len: contents.len() as u64,
                        }),
                )
                .collect();

            out.sort_by(|a, b| a.path.cmp(&b.path));
            Ok(out)
        })
    }

    async fn stat(&self, path: &TablePath) -> StorageResult<FileStatus> {
        self.inner.counters.stat.fetch_add(1, Ordering::Relaxed);
        self.with_tree(|tree| {
            Self::check_failure(tree, path)?;

            if let Some(contents) = tree.files.get(path) {
                return Ok(FileStatus {
                    path: path.clone(),
                    kind: FileKind::File,
                    len: contents.len() as u64,
                });
            }
            if tree.is_dir(path) {
                return Ok(FileStatus {
                    path: path.clone(),
                    kind: FileKind::Directory,
                    len: 0,
                });
            }
            Err(memory_err(path, io::ErrorKind::NotFound, "no such file or directory"))
        })
    }

    async fn read_to_string(&self, path: &TablePath) -> StorageResult<String> {
        self.inner.counters.read.fetch_add(1, Ordering::Relaxed);
        self.with_tree(|tree| {
            Self::check_failure(tree, path)?;

            match tree.files.get(path) {
                Some(contents) => Ok(contents.clone()),
                None if tree.is_dir(path) => Err(memory_err(
                    path,
                    io::ErrorKind::IsADirectory,
                    "is a directory",
                )),
                None => Err(memory_err(path, io::ErrorKind::NotFound, "no such file")),
            }
        })
    }
}

#[async_trait]
impl FileSystemProvider for MemoryFileSystem {
    async fn open(&self, _config: &StorageConfig) -> StorageResult<FileSystemRef> {
        self.inner.counters.open.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(self.clone()))
    }
}
