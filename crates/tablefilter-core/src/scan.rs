//! Directory scanning on top of [`TablePathFilter`].

use std::collections::VecDeque;

use futures::{StreamExt, TryStreamExt, stream};
use log::debug;
use snafu::prelude::*;

use crate::config::ScanConfig;
use crate::error::{ClassifyError, ListingSnafu, OpenFileSystemSnafu, PathFilterError, PathFilterResult};
use crate::filter::TablePathFilter;
use crate::layout;
use crate::path::TablePath;

/// Files of a scan split by the filter's verdict, each in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Visible files.
    pub accepted: Vec<TablePath>,
    /// Hidden files (superseded versions, in-flight commits).
    pub rejected: Vec<TablePath>,
}

impl ScanReport {
    /// Number of files examined.
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

/// List the files under `dir` and run every one of them through `filter`.
///
/// Directories are walked breadth first when `config.recursive` is set; the
/// table metadata folder is never entered. At most `config.concurrency`
/// `accept` calls are in flight at once.
pub async fn list_visible_files(
    filter: &TablePathFilter,
    dir: &TablePath,
    config: &ScanConfig,
) -> PathFilterResult<ScanReport> {
    let files = collect_files(filter, dir, config.recursive)
        .await
        .map_err(|source| PathFilterError::new(dir.to_string(), None, source))?;
    debug!("scanning {} files under {dir}", files.len());

    let verdicts: Vec<(TablePath, bool)> = stream::iter(files)
        .map(|path| async move {
            let accept = filter.accept(&path).await?;
            Ok::<_, PathFilterError>((path, accept))
        })
        .buffered(config.concurrency.max(1))
        .try_collect()
        .await?;

    let mut report = ScanReport::default();
    for (path, accept) in verdicts {
        if accept {
            report.accepted.push(path);
        } else {
            report.rejected.push(path);
        }
    }
    Ok(report)
}

async fn collect_files(
    filter: &TablePathFilter,
    dir: &TablePath,
    recursive: bool,
) -> Result<Vec<TablePath>, ClassifyError> {
    let fs = filter.file_system().await.context(OpenFileSystemSnafu)?;

    let mut files = Vec::new();
    let mut pending = VecDeque::from([dir.clone()]);
    while let Some(current) = pending.pop_front() {
        let entries = fs.list_dir(&current).await.context(ListingSnafu {
            dir: current.to_string(),
        })?;
        for entry in entries {
            if entry.is_file() {
                files.push(entry.path);
            } else if recursive && entry.path.name() != Some(layout::METAFOLDER_NAME) {
                pending.push_back(entry.path);
            }
        }
    }
    Ok(files)
}
