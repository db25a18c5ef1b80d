//! The path filter: decides whether one file path is visible to readers.
//!
//! `accept` runs a small state machine per call:
//!
//! ```text
//! metafolder check -> parent folder -> cache lookup
//!   Unmanaged          -> accept
//!   Managed(set)       -> accept iff path in set
//!   Miss -> locate root
//!             none     -> cache unmanaged, accept
//!             root     -> resolve
//!                          NotATable    -> cache unmanaged, accept
//!                          Managed(set) -> cache set, accept iff path in set
//! ```
//!
//! The metafolder check runs before the cache so the exclusion holds whatever
//! the parent directory was classified as. Every fatal failure is logged and
//! returned as a [`PathFilterError`] naming the path and the folder.

use std::fmt;
use std::sync::Arc;

use log::{debug, error, info};
use snafu::prelude::*;
use tokio::sync::OnceCell;

use crate::cache::{CacheLookup, DirectoryClassificationCache};
use crate::config::FilterConfig;
use crate::error::{
    ClassifyError, InvalidPathSnafu, MalformedInputSnafu, MetadataSnafu, OpenFileSystemSnafu,
    PathFilterError, PathFilterResult,
};
use crate::layout;
use crate::locator::TableRootLocator;
use crate::partition::PartitionProbe;
use crate::path::TablePath;
use crate::resolver::{LatestVersionResolver, Resolution};
use crate::storage::{
    FileSystemProvider, FileSystemRef, LocalFileSystemProvider, StorageConfig, StorageResult,
};
use crate::transaction_log::TableMetadataReader;

/// Read-optimized visibility filter for files of managed tables.
///
/// Files under a managed table are visible only when they are the latest
/// version of their file group as of the last completed commit; every other
/// file is visible. One instance owns its cache and its filesystem handle and
/// may be shared across tasks through an `Arc`.
pub struct TablePathFilter {
    provider: Arc<dyn FileSystemProvider>,
    storage: StorageConfig,
    fs: OnceCell<FileSystemRef>,
    cache: DirectoryClassificationCache,
    locator: TableRootLocator,
    resolver: LatestVersionResolver,
}

impl fmt::Debug for TablePathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TablePathFilter")
            .field("provider", &self.provider)
            .field("storage", &self.storage)
            .field("fs_opened", &self.fs.initialized())
            .field("locator", &self.locator)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl TablePathFilter {
    /// Filter opening its filesystem through `provider` with `storage`.
    ///
    /// Nothing is opened until the first [`accept`](Self::accept) call.
    pub fn new(provider: Arc<dyn FileSystemProvider>, storage: StorageConfig) -> Self {
        Self {
            provider,
            storage,
            fs: OnceCell::new(),
            cache: DirectoryClassificationCache::new(),
            locator: TableRootLocator::default(),
            resolver: LatestVersionResolver::default(),
        }
    }

    /// Filter over the local filesystem, using table paths as-is.
    pub fn local() -> Self {
        Self::new(Arc::new(LocalFileSystemProvider), StorageConfig::default())
    }

    /// Filter over the local filesystem configured by `config`.
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(Arc::new(LocalFileSystemProvider), config.storage.clone())
    }

    /// Replace the partition probe used for root discovery.
    pub fn with_partition_probe(mut self, probe: Arc<dyn PartitionProbe>) -> Self {
        let fallback = self.locator.fallback_depth();
        self.locator = TableRootLocator::new(probe).with_fallback_depth(fallback);
        self
    }

    /// Replace the table metadata reader.
    pub fn with_table_reader(mut self, reader: Arc<dyn TableMetadataReader>) -> Self {
        self.resolver = LatestVersionResolver::new(reader);
        self
    }

    /// The classification cache of this instance.
    ///
    /// Callers can inspect it; only classification writes to it.
    pub fn cache(&self) -> &DirectoryClassificationCache {
        &self.cache
    }

    /// The filesystem handle, opened on first use.
    ///
    /// Concurrent first calls share one open. A failed open is not
    /// remembered; the next call tries again.
    pub async fn file_system(&self) -> StorageResult<FileSystemRef> {
        self.fs
            .get_or_try_init(|| async {
                debug!("opening filesystem with {:?}", self.storage);
                self.provider.open(&self.storage).await
            })
            .await
            .map(Arc::clone)
    }

    /// Parse `path` and run [`accept`](Self::accept) on it.
    pub async fn accept_str(&self, path: &str) -> PathFilterResult<bool> {
        let parsed = TablePath::parse(path)
            .context(InvalidPathSnafu)
            .map_err(|source| self.fail(path, None, source))?;
        self.accept(&parsed).await
    }

    /// Whether `path` (assumed to be a file) is visible.
    pub async fn accept(&self, path: &TablePath) -> PathFilterResult<bool> {
        debug!("checking acceptance for path {path}");

        if layout::is_in_metafolder(path) {
            debug!("skipping table metadata file {path}");
            return Ok(false);
        }

        let folder = path
            .parent()
            .context(MalformedInputSnafu {
                msg: "path has no parent directory",
            })
            .map_err(|source| self.fail(&path.to_string(), None, source))?;

        match self.cache.lookup(&folder).await {
            CacheLookup::Unmanaged => {
                debug!("accepting unmanaged path from cache: {path}");
                return Ok(true);
            }
            CacheLookup::Managed(accepted) => {
                let accept = accepted.contains(path);
                debug!("{path} checked against cache, accept => {accept}");
                return Ok(accept);
            }
            CacheLookup::Miss => {}
        }

        self.classify(path, &folder).await.map_err(|source| {
            self.fail(&path.to_string(), Some(folder.to_string()), source)
        })
    }

    async fn classify(&self, path: &TablePath, folder: &TablePath) -> Result<bool, ClassifyError> {
        let fs = self.file_system().await.context(OpenFileSystemSnafu)?;

        let Some(root) = self
            .locator
            .locate(fs.as_ref(), folder)
            .await
            .context(MetadataSnafu)?
        else {
            debug!("caching unmanaged folder {folder} (no candidate root)");
            self.cache.mark_unmanaged(folder).await;
            return Ok(true);
        };

        match self.resolver.resolve(fs.as_ref(), &root, folder).await? {
            Resolution::NotATable => {
                debug!("caching unmanaged folder {folder} (no table at {root})");
                self.cache.mark_unmanaged(folder).await;
                Ok(true)
            }
            Resolution::Managed(latest) => {
                info!(
                    "based on table metadata from root {root}, caching {} files under {folder}",
                    latest.len()
                );
                let accepted = self.cache.record_managed(folder, latest).await;
                let accept = accepted.contains(path);
                debug!("{path} checked after cache population, accept => {accept}");
                Ok(accept)
            }
        }
    }

    fn fail(&self, path: &str, folder: Option<String>, source: ClassifyError) -> PathFilterError {
        let err = PathFilterError::new(path, folder, source);
        error!("{err}");
        err
    }
}
