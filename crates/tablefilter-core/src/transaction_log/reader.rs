//! Opening candidate roots as managed tables.
//!
//! [`TableMetadataReader`] is the seam the resolver depends on;
//! [`LogTableReader`] is the implementation for the `.table_log/` layout:
//! - No `.table_log` directory under the root: [`TableOpen::NotATable`].
//! - `CURRENT` missing: a partially initialized table with an empty completed
//!   timeline (version 0).
//! - `CURRENT` empty, unparsable, or pointing at a commit file that does not
//!   exist: `MetadataError::CorruptState`.
//! - Storage failures are propagated as `MetadataError::Storage`.

use std::fmt;

use async_trait::async_trait;
use snafu::prelude::*;

use crate::layout;
use crate::path::TablePath;
use crate::storage::{self, FileSystem};
use crate::transaction_log::{
    CommitTimeline, CorruptStateSnafu, MetadataError, StorageSnafu, TableHandle,
};

/// Outcome of opening a candidate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOpen {
    /// The root holds a managed table.
    Table(TableHandle),
    /// The root holds no table metadata; callers treat the data as unmanaged.
    NotATable,
}

/// Reads table metadata for a candidate root.
#[async_trait]
pub trait TableMetadataReader: Send + Sync + fmt::Debug {
    /// Open `root` as a managed table.
    async fn open_as_table(
        &self,
        fs: &dyn FileSystem,
        root: &TablePath,
    ) -> Result<TableOpen, MetadataError>;
}

/// [`TableMetadataReader`] for the `.table_log/` commit log layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTableReader;

impl LogTableReader {
    /// Load the `CURRENT` version pointer of the table at `root`.
    ///
    /// Behavior:
    /// - If CURRENT does not exist, treat as a fresh table and return 0.
    /// - If CURRENT contains invalid or empty content, return CorruptState.
    pub async fn load_current_version(
        fs: &dyn FileSystem,
        root: &TablePath,
    ) -> Result<u64, MetadataError> {
        let path = layout::current_path(root);

        let contents = match fs.read_to_string(&path).await {
            Ok(s) => s,
            Err(e) if e.is_not_found() => return Ok(0),
            Err(source) => return Err(MetadataError::Storage { source }),
        };

        let trimmed = contents.trim();
        ensure!(
            !trimmed.is_empty(),
            CorruptStateSnafu {
                path: path.to_string(),
                msg: "CURRENT has empty content",
            }
        );

        trimmed.parse::<u64>().map_err(|e| {
            CorruptStateSnafu {
                path: path.to_string(),
                msg: format!("CURRENT has invalid content {trimmed:?}: {e}"),
            }
            .build()
        })
    }
}

#[async_trait]
impl TableMetadataReader for LogTableReader {
    async fn open_as_table(
        &self,
        fs: &dyn FileSystem,
        root: &TablePath,
    ) -> Result<TableOpen, MetadataError> {
        let log_dir = layout::metafolder_path(root);

        match storage::stat_opt(fs, &log_dir).await.context(StorageSnafu)? {
            Some(status) if status.is_dir() => {}
            _ => return Ok(TableOpen::NotATable),
        }

        let entries = fs.list_dir(&log_dir).await.context(StorageSnafu)?;

        let mut has_current = false;
        let mut versions = Vec::new();
        for entry in entries.iter().filter(|e| e.is_file()) {
            match entry.path.name() {
                Some(layout::CURRENT_FILE_NAME) => has_current = true,
                Some(name) => versions.extend(layout::parse_commit_file_name(name)),
                None => {}
            }
        }

        let current = if has_current {
            Self::load_current_version(fs, root).await?
        } else {
            0
        };

        ensure!(
            current == 0 || versions.contains(&current),
            CorruptStateSnafu {
                path: log_dir.to_string(),
                msg: format!(
                    "CURRENT points at version {current} but {} is missing",
                    layout::commit_file_name(current)
                ),
            }
        );

        let timeline = CommitTimeline::new(current, versions);
        Ok(TableOpen::Table(TableHandle::new(
            root.clone(),
            current,
            timeline,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryFileSystem, StorageError};
    use crate::transaction_log::CommitState;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn p(s: &str) -> TablePath {
        TablePath::parse(s).expect("valid test path")
    }

    fn write_log(fs: &MemoryFileSystem, root: &TablePath, current: Option<&str>, commits: &[u64]) {
        let log_dir = layout::metafolder_path(root);
        fs.create_dir(&log_dir);
        for v in commits {
            fs.put_file(&log_dir.child_unchecked(&layout::commit_file_name(*v)), "{}");
        }
        if let Some(current) = current {
            fs.put_file(&layout::current_path(root), current);
        }
    }

    fn expect_table(open: TableOpen) -> TableHandle {
        match open {
            TableOpen::Table(handle) => handle,
            TableOpen::NotATable => panic!("expected a table"),
        }
    }

    #[tokio::test]
    async fn missing_metafolder_is_not_a_table() -> TestResult {
        let fs = MemoryFileSystem::new();
        fs.create_dir(&p("/w/t"));

        let open = LogTableReader.open_as_table(&fs, &p("/w/t")).await?;
        assert_eq!(open, TableOpen::NotATable);

        // Root that does not exist at all.
        let open = LogTableReader.open_as_table(&fs, &p("/nowhere")).await?;
        assert_eq!(open, TableOpen::NotATable);
        Ok(())
    }

    #[tokio::test]
    async fn metafolder_that_is_a_file_is_not_a_table() -> TestResult {
        let fs = MemoryFileSystem::new();
        fs.put_file(&layout::metafolder_path(&p("/w/t")), "oops");

        let open = LogTableReader.open_as_table(&fs, &p("/w/t")).await?;
        assert_eq!(open, TableOpen::NotATable);
        Ok(())
    }

    #[tokio::test]
    async fn reads_timeline_with_pending_commits() -> TestResult {
        let fs = MemoryFileSystem::new();
        let root = p("/w/t");
        write_log(&fs, &root, Some("2\n"), &[1, 2, 3]);
        fs.put_file(&layout::metafolder_path(&root).child_unchecked("0000000004.tmp"), "");

        let handle = expect_table(LogTableReader.open_as_table(&fs, &root).await?);
        assert_eq!(handle.current_version(), 2);
        assert_eq!(handle.timeline().len(), 3);
        assert_eq!(
            handle.timeline().instants()[2].state,
            CommitState::Pending
        );
        assert_eq!(handle.completed_commits_view().last_completed(), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn missing_current_is_a_partially_initialized_table() -> TestResult {
        let fs = MemoryFileSystem::new();
        let root = p("/w/t");
        write_log(&fs, &root, None, &[1]);

        let handle = expect_table(LogTableReader.open_as_table(&fs, &root).await?);
        assert_eq!(handle.current_version(), 0);
        assert!(handle.completed_commits_view().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_current_is_reported() -> TestResult {
        let fs = MemoryFileSystem::new();
        let root = p("/w/t");

        write_log(&fs, &root, Some("   \n"), &[1]);
        let err = LogTableReader
            .open_as_table(&fs, &root)
            .await
            .expect_err("empty CURRENT");
        assert!(matches!(err, MetadataError::CorruptState { .. }));

        write_log(&fs, &root, Some("not-a-number"), &[1]);
        let err = LogTableReader
            .open_as_table(&fs, &root)
            .await
            .expect_err("invalid CURRENT");
        assert!(matches!(err, MetadataError::CorruptState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn current_pointing_at_missing_commit_is_corrupt() -> TestResult {
        let fs = MemoryFileSystem::new();
        let root = p("/w/t");
        write_log(&fs, &root, Some("3"), &[1, 2]);

        let err = LogTableReader
            .open_as_table(&fs, &root)
            .await
            .expect_err("dangling CURRENT");
        match err {
            MetadataError::CorruptState { msg, .. } => assert!(msg.contains("0000000003.json")),
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn storage_failures_propagate() -> TestResult {
        let fs = MemoryFileSystem::new();
        let root = p("/w/t");
        write_log(&fs, &root, Some("1"), &[1]);
        fs.fail_path(&layout::metafolder_path(&root));

        let err = LogTableReader
            .open_as_table(&fs, &root)
            .await
            .expect_err("injected failure");
        assert!(matches!(
            err,
            MetadataError::Storage {
                source: StorageError::OtherIo { .. }
            }
        ));
        Ok(())
    }
}
