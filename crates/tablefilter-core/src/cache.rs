//! Per-filter cache of directory classifications.
//!
//! Two structures sit behind one [`tokio::sync::RwLock`]: directories known to
//! hold a managed table's data (with the exact set of accepted files) and
//! directories known to be unmanaged. Keeping both under one lock lets every
//! write remove the key from the other structure atomically, so a directory is
//! never managed and unmanaged at the same time.
//!
//! Entries are never evicted or refreshed. A file committed after its
//! directory was cached stays invisible to this cache until a new filter is
//! built.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::path::TablePath;

/// Normalized string form of a directory; the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectoryKey(String);

impl DirectoryKey {
    /// Key of `dir`.
    pub fn new(dir: &TablePath) -> Self {
        Self(dir.to_string())
    }

    /// The normalized directory string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DirectoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of [`DirectoryClassificationCache::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// The directory is not part of a managed table; every file is visible.
    Unmanaged,
    /// The directory belongs to a managed table; only these files are visible.
    Managed(Arc<HashSet<TablePath>>),
    /// Nothing known yet.
    Miss,
}

#[derive(Debug, Default)]
struct CacheState {
    managed: HashMap<DirectoryKey, Arc<HashSet<TablePath>>>,
    unmanaged: HashSet<DirectoryKey>,
}

/// Directory classification cache owned by one filter instance.
#[derive(Debug, Default)]
pub struct DirectoryClassificationCache {
    state: RwLock<CacheState>,
}

impl DirectoryClassificationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a directory.
    pub async fn lookup(&self, dir: &TablePath) -> CacheLookup {
        let key = DirectoryKey::new(dir);
        let state = self.state.read().await;

        if state.unmanaged.contains(&key) {
            return CacheLookup::Unmanaged;
        }
        match state.managed.get(&key) {
            Some(accepted) => CacheLookup::Managed(Arc::clone(accepted)),
            None => CacheLookup::Miss,
        }
    }

    /// Record `dir` as unmanaged, dropping any managed entry for it.
    pub(crate) async fn mark_unmanaged(&self, dir: &TablePath) {
        let key = DirectoryKey::new(dir);
        let mut state = self.state.write().await;
        state.managed.remove(&key);
        state.unmanaged.insert(key);
    }

    /// Record the accepted files of managed directory `dir`, replacing any
    /// previous entry and dropping an unmanaged mark. Returns the shared set.
    pub(crate) async fn record_managed(
        &self,
        dir: &TablePath,
        accepted: HashSet<TablePath>,
    ) -> Arc<HashSet<TablePath>> {
        let key = DirectoryKey::new(dir);
        let accepted = Arc::new(accepted);
        let mut state = self.state.write().await;
        state.unmanaged.remove(&key);
        state.managed.insert(key, Arc::clone(&accepted));
        accepted
    }

    /// Number of managed directories.
    pub async fn managed_len(&self) -> usize {
        self.state.read().await.managed.len()
    }

    /// Number of unmanaged directories.
    pub async fn unmanaged_len(&self) -> usize {
        self.state.read().await.unmanaged.len()
    }

    /// Whether `dir` is recorded as unmanaged.
    pub async fn is_unmanaged(&self, dir: &TablePath) -> bool {
        self.state
            .read()
            .await
            .unmanaged
            .contains(&DirectoryKey::new(dir))
    }
}
