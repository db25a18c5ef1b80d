//! Candidate table root discovery.
//!
//! Guess, then verify: the locator only proposes a root. Whether it really
//! holds a table is decided later by the metadata reader.

use std::sync::Arc;

use log::debug;
use snafu::prelude::*;

use crate::layout;
use crate::partition::{PartitionMarkerProbe, PartitionProbe, PartitionProbeResult};
use crate::path::TablePath;
use crate::storage::FileSystem;
use crate::transaction_log::{CorruptStateSnafu, MetadataError};

/// Walks up from a data directory to the directory that should hold the
/// table's metadata folder.
#[derive(Debug, Clone)]
pub struct TableRootLocator {
    probe: Arc<dyn PartitionProbe>,
    fallback_depth: usize,
}

impl Default for TableRootLocator {
    fn default() -> Self {
        Self::new(Arc::new(PartitionMarkerProbe))
    }
}

impl TableRootLocator {
    /// Locator using `probe` and the default fallback depth.
    pub fn new(probe: Arc<dyn PartitionProbe>) -> Self {
        Self {
            probe,
            fallback_depth: layout::DEFAULT_ROOT_DEPTH,
        }
    }

    /// Override the number of levels used when `dir` has no partition markers.
    pub fn with_fallback_depth(mut self, depth: usize) -> Self {
        self.fallback_depth = depth;
        self
    }

    /// Levels used when no partition markers are present.
    pub fn fallback_depth(&self) -> usize {
        self.fallback_depth
    }

    /// Candidate table root for `dir`.
    ///
    /// - Partition markers with depth `d`: the `d`-th ancestor of `dir`. A
    ///   depth deeper than `dir` itself is `MetadataError::CorruptState`.
    /// - No markers: the fallback ancestor, or `None` when `dir` is too
    ///   shallow to have one.
    pub async fn locate(
        &self,
        fs: &dyn FileSystem,
        dir: &TablePath,
    ) -> Result<Option<TablePath>, MetadataError> {
        match self.probe.probe(fs, dir).await? {
            PartitionProbeResult::Partitioned { depth } => {
                let root = usize::try_from(depth)
                    .ok()
                    .and_then(|d| dir.ancestor(d))
                    .context(CorruptStateSnafu {
                        path: layout::partition_metadata_path(dir).to_string(),
                        msg: format!(
                            "partition depth {depth} exceeds the {} levels above the directory",
                            dir.depth()
                        ),
                    })?;
                debug!("partition markers in {dir} point at root {root} (depth {depth})");
                Ok(Some(root))
            }
            PartitionProbeResult::Unpartitioned => {
                let root = dir.ancestor(self.fallback_depth);
                match &root {
                    Some(root) => debug!("no partition markers in {dir}; guessing root {root}"),
                    None => debug!("no partition markers in {dir} and too shallow for a root"),
                }
                Ok(root)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryFileSystem;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn p(s: &str) -> TablePath {
        TablePath::parse(s).expect("valid test path")
    }

    fn mark(fs: &MemoryFileSystem, dir: &TablePath, depth: u32) {
        fs.put_file(
            &layout::partition_metadata_path(dir),
            format!(r#"{{"partition_depth": {depth}}}"#),
        );
    }

    #[tokio::test]
    async fn marker_depth_selects_ancestor() -> TestResult {
        let fs = MemoryFileSystem::new();
        let dir = p("/w/t/2024/01/01");
        mark(&fs, &dir, 3);

        let root = TableRootLocator::default().locate(&fs, &dir).await?;
        assert_eq!(root, Some(p("/w/t")));
        Ok(())
    }

    #[tokio::test]
    async fn depth_zero_means_the_directory_itself() -> TestResult {
        let fs = MemoryFileSystem::new();
        let dir = p("/w/t");
        mark(&fs, &dir, 0);

        let root = TableRootLocator::default().locate(&fs, &dir).await?;
        assert_eq!(root, Some(dir));
        Ok(())
    }

    #[tokio::test]
    async fn depth_beyond_the_filesystem_root_is_corrupt() {
        let fs = MemoryFileSystem::new();
        let dir = p("/a/b");
        mark(&fs, &dir, 5);

        let err = TableRootLocator::default()
            .locate(&fs, &dir)
            .await
            .expect_err("depth overflow");
        assert!(matches!(err, MetadataError::CorruptState { .. }));
    }

    #[tokio::test]
    async fn fallback_uses_third_ancestor() -> TestResult {
        let fs = MemoryFileSystem::new();
        let locator = TableRootLocator::default();

        let root = locator.locate(&fs, &p("/d/p1/p2/p3/partA")).await?;
        assert_eq!(root, Some(p("/d/p1")));

        // Exactly three levels deep: the filesystem root is the candidate.
        let root = locator.locate(&fs, &p("/a/b/c")).await?;
        assert_eq!(root, Some(TablePath::root()));
        Ok(())
    }

    #[tokio::test]
    async fn shallow_directories_have_no_candidate() -> TestResult {
        let fs = MemoryFileSystem::new();
        let locator = TableRootLocator::default();

        assert_eq!(locator.locate(&fs, &p("/tmp")).await?, None);
        assert_eq!(locator.locate(&fs, &p("/a/b")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn fallback_depth_is_configurable() -> TestResult {
        let fs = MemoryFileSystem::new();
        let locator = TableRootLocator::default().with_fallback_depth(1);
        assert_eq!(locator.fallback_depth(), 1);

        let root = locator.locate(&fs, &p("/w/t/data")).await?;
        assert_eq!(root, Some(p("/w/t")));
        Ok(())
    }
}
