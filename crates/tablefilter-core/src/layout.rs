//! On-disk layout conventions of a managed table.
//!
//! ```text
//! table_root/
//!   .table_log/                    # reserved metadata folder
//!     CURRENT                      # latest completed version (e.g. "3\n")
//!     0000000001.json              # commit files, zero padded
//!     0000000004.json              # version > CURRENT: in flight or failed
//!   2024/01/01/                    # partition directory
//!     .partition_metadata          # {"partition_depth": 3}
//!     <group>_<token>_<version>.parquet
//! ```
//!
//! Every path convention lives here so the reader, the probe and the filter
//! never build these names by hand.

use std::fmt;

use crate::path::TablePath;

/// Name of the reserved metadata folder under a table root.
pub const METAFOLDER_NAME: &str = ".table_log";

/// Name of the file that stores the latest completed version.
pub const CURRENT_FILE_NAME: &str = "CURRENT";

/// Number of digits used in zero-padded commit file names.
pub const COMMIT_FILENAME_DIGITS: usize = 10;

/// Extension of commit files.
pub const COMMIT_FILE_EXT: &str = "json";

/// Per-partition marker file recording the depth to the table root.
pub const PARTITION_METADATA_FILE: &str = ".partition_metadata";

/// Levels between an unpartitioned data directory and its table root when no
/// partition marker says otherwise.
pub const DEFAULT_ROOT_DEPTH: usize = 3;

/// `<root>/.table_log`
pub fn metafolder_path(root: &TablePath) -> TablePath {
    root.child_unchecked(METAFOLDER_NAME)
}

/// `<root>/.table_log/CURRENT`
pub fn current_path(root: &TablePath) -> TablePath {
    metafolder_path(root).child_unchecked(CURRENT_FILE_NAME)
}

/// `<dir>/.partition_metadata`
pub fn partition_metadata_path(dir: &TablePath) -> TablePath {
    dir.child_unchecked(PARTITION_METADATA_FILE)
}

/// Whether `path` is the reserved metadata folder or lies underneath it.
pub fn is_in_metafolder(path: &TablePath) -> bool {
    path.contains_segment(METAFOLDER_NAME)
}

/// File name of the commit for `version`, e.g. `0000000003.json`.
pub fn commit_file_name(version: u64) -> String {
    format!(
        "{:0width$}.{COMMIT_FILE_EXT}",
        version,
        width = COMMIT_FILENAME_DIGITS
    )
}

/// Parse a commit file name back into its version.
///
/// Anything other than exactly `COMMIT_FILENAME_DIGITS` digits followed by
/// `.json` (temp files, `CURRENT`, stray files) yields `None`.
pub fn parse_commit_file_name(name: &str) -> Option<u64> {
    let digits = name.strip_suffix(COMMIT_FILE_EXT)?.strip_suffix('.')?;
    if digits.len() != COMMIT_FILENAME_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parsed name of a data file: `<group>_<token>_<version>.<ext>`.
///
/// The name is split from the right, so the file group id may itself contain
/// underscores. Each commit that rewrites a group produces a new file with the
/// same group and a higher version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFileName {
    /// Logical record group the file belongs to.
    pub file_group: String,
    /// Writer token distinguishing attempts within one commit.
    pub write_token: String,
    /// Version of the commit that wrote the file.
    pub commit_version: u64,
    /// File extension without the dot (e.g. `parquet`).
    pub extension: String,
}

impl DataFileName {
    /// Parse a data file name; hidden files and other names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        if name.starts_with('.') {
            return None;
        }

        let (stem, extension) = name.rsplit_once('.')?;
        let (rest, version) = stem.rsplit_once('_')?;
        let (file_group, write_token) = rest.rsplit_once('_')?;

        if extension.is_empty()
            || file_group.is_empty()
            || write_token.is_empty()
            || version.is_empty()
            || !version.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        Some(Self {
            file_group: file_group.to_string(),
            write_token: write_token.to_string(),
            commit_version: version.parse().ok()?,
            extension: extension.to_string(),
        })
    }
}

impl fmt::Display for DataFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{:0width$}.{}",
            self.file_group,
            self.write_token,
            self.commit_version,
            self.extension,
            width = COMMIT_FILENAME_DIGITS
        )
    }
}
