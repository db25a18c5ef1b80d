//! Ordered commit timeline of a table.

/// Lifecycle state of a commit as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitState {
    /// At or below `CURRENT`: the commit is durable and visible.
    Completed,
    /// Above `CURRENT`: in flight or failed; never visible.
    Pending,
}

/// One entry of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitInstant {
    /// Commit version (monotonic, starting from 1).
    pub version: u64,
    /// Whether readers may observe the commit.
    pub state: CommitState,
}

/// Commits of a table, sorted by version and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitTimeline {
    instants: Vec<CommitInstant>,
}

impl CommitTimeline {
    /// Build a timeline from the commit versions found in the log and the
    /// `CURRENT` pointer.
    pub fn new(current: u64, versions: impl IntoIterator<Item = u64>) -> Self {
        let mut versions: Vec<u64> = versions.into_iter().collect();
        versions.sort_unstable();
        versions.dedup();

        let instants = versions
            .into_iter()
            .map(|version| CommitInstant {
                version,
                state: if version <= current {
                    CommitState::Completed
                } else {
                    CommitState::Pending
                },
            })
            .collect();

        Self { instants }
    }

    /// All instants, oldest first.
    pub fn instants(&self) -> &[CommitInstant] {
        &self.instants
    }

    /// A timeline restricted to completed commits.
    pub fn filter_completed(&self) -> Self {
        Self {
            instants: self
                .instants
                .iter()
                .copied()
                .filter(|i| i.state == CommitState::Completed)
                .collect(),
        }
    }

    /// Whether `version` is a completed commit of this timeline.
    ///
    /// Versions older than the first retained completed commit have been
    /// archived out of the log and count as completed. Above that, only
    /// retained completed instants qualify, so gaps between them do not.
    pub fn contains_completed(&self, version: u64) -> bool {
        let Some(first) = self.first_completed() else {
            return false;
        };
        if version == 0 {
            return false;
        }
        if version < first {
            return true;
        }
        self.instants
            .binary_search_by_key(&version, |i| i.version)
            .is_ok_and(|idx| self.instants[idx].state == CommitState::Completed)
    }

    /// Oldest completed version still present in the log, if any.
    pub fn first_completed(&self) -> Option<u64> {
        self.instants
            .iter()
            .find(|i| i.state == CommitState::Completed)
            .map(|i| i.version)
    }

    /// Latest completed version, if any.
    pub fn last_completed(&self) -> Option<u64> {
        self.instants
            .iter()
            .rev()
            .find(|i| i.state == CommitState::Completed)
            .map(|i| i.version)
    }

    /// Number of instants.
    pub fn len(&self) -> usize {
        self.instants.len()
    }

    /// Whether the timeline has no instants.
    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }
}
