//! Latest-version resolution for one directory of a candidate table.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;
use snafu::prelude::*;

use crate::error::{ClassifyError, ListingSnafu, MetadataSnafu};
use crate::path::TablePath;
use crate::storage::FileSystem;
use crate::transaction_log::{LogTableReader, TableMetadataReader, TableOpen};

/// Outcome of resolving a directory against a candidate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The root is a managed table; exactly these files are visible.
    Managed(HashSet<TablePath>),
    /// The candidate root holds no table.
    NotATable,
}

/// Computes the visible files of a directory from the table's metadata.
#[derive(Debug, Clone)]
pub struct LatestVersionResolver {
    reader: Arc<dyn TableMetadataReader>,
}

impl Default for LatestVersionResolver {
    fn default() -> Self {
        Self::new(Arc::new(LogTableReader))
    }
}

impl LatestVersionResolver {
    /// Resolver backed by `reader`.
    pub fn new(reader: Arc<dyn TableMetadataReader>) -> Self {
        Self { reader }
    }

    /// Resolve `dir` against the candidate table `root`.
    ///
    /// Reads the completed commit timeline once, lists `dir` once and keeps
    /// the latest file of every group. The result covers the whole directory
    /// so every later file in it is answered from the cache.
    pub async fn resolve(
        &self,
        fs: &dyn FileSystem,
        root: &TablePath,
        dir: &TablePath,
    ) -> Result<Resolution, ClassifyError> {
        let handle = match self
            .reader
            .open_as_table(fs, root)
            .await
            .context(MetadataSnafu)?
        {
            TableOpen::Table(handle) => handle,
            TableOpen::NotATable => {
                debug!("{root} is not a table root");
                return Ok(Resolution::NotATable);
            }
        };

        let completed = handle.completed_commits_view();
        let listing = fs.list_dir(dir).await.context(ListingSnafu {
            dir: dir.to_string(),
        })?;
        let latest = handle.latest_files_among(&completed, &listing);

        debug!(
            "resolved {dir} against {root}: {} of {} entries visible (completed through {:?})",
            latest.len(),
            listing.len(),
            completed.last_completed()
        );
        Ok(Resolution::Managed(latest))
    }
}
