//! Handle over an opened managed table.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::layout::DataFileName;
use crate::path::TablePath;
use crate::storage::FileStatus;
use crate::transaction_log::CommitTimeline;

/// Read-only view of a managed table, produced by a
/// [`TableMetadataReader`](crate::transaction_log::TableMetadataReader).
///
/// Invariant: `current_version` is the `CURRENT` pointer observed when the
/// handle was opened and `timeline` classifies every commit file of the log
/// against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    root: TablePath,
    current_version: u64,
    timeline: CommitTimeline,
}

impl TableHandle {
    /// Assemble a handle from already-validated log state.
    pub fn new(root: TablePath, current_version: u64, timeline: CommitTimeline) -> Self {
        Self {
            root,
            current_version,
            timeline,
        }
    }

    /// Table root directory.
    pub fn root(&self) -> &TablePath {
        &self.root
    }

    /// `CURRENT` pointer at open time (0 for a table without commits).
    pub fn current_version(&self) -> u64 {
        self.current_version
    }

    /// Full timeline, including pending commits.
    pub fn timeline(&self) -> &CommitTimeline {
        &self.timeline
    }

    /// Timeline restricted to completed commits.
    pub fn completed_commits_view(&self) -> CommitTimeline {
        self.timeline.filter_completed()
    }

    /// The latest valid data file per file group among `listing`.
    ///
    /// A file is a candidate when its name parses as a data file and its
    /// commit is completed in `timeline`. Per group the highest commit version
    /// wins; equal versions fall back to the larger write token so the choice
    /// is deterministic. Directories and non-data files never qualify.
    pub fn latest_files_among(
        &self,
        timeline: &CommitTimeline,
        listing: &[FileStatus],
    ) -> HashSet<TablePath> {
        let mut latest: HashMap<String, (u64, String, &TablePath)> = HashMap::new();

        for status in listing.iter().filter(|s| s.is_file()) {
            let Some(parsed) = status.path.name().and_then(DataFileName::parse) else {
                continue;
            };
            if !timeline.contains_completed(parsed.commit_version) {
                continue;
            }

            let candidate = (parsed.commit_version, parsed.write_token);
            match latest.get_mut(&parsed.file_group) {
                Some(best) if (best.0, &best.1) >= (candidate.0, &candidate.1) => {}
                Some(best) => *best = (candidate.0, candidate.1, &status.path),
                None => {
                    latest.insert(parsed.file_group, (candidate.0, candidate.1, &status.path));
                }
            }
        }

        latest
            .into_values()
            .map(|(_, _, path)| path.clone())
            .collect()
    }
}
