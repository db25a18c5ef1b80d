//! Read-only view over a table's commit log.
//!
//! Writers append zero-padded commit files under `<root>/.table_log/` and then
//! move the `CURRENT` pointer forward. A commit file whose version is above
//! `CURRENT` belongs to a writer that is still in flight or that crashed
//! between creating the commit and advancing the pointer; readers must ignore
//! it. This module never writes anything: it lists the log, reads `CURRENT`
//! and exposes the result as a [`CommitTimeline`] inside a [`TableHandle`].
//!
//! Opening a directory that has no `.table_log` folder is not an error; it is
//! the routine [`TableOpen::NotATable`] outcome.

pub mod reader;
pub mod table_handle;
pub mod timeline;

pub use reader::{LogTableReader, TableMetadataReader, TableOpen};
pub use table_handle::TableHandle;
pub use timeline::{CommitInstant, CommitState, CommitTimeline};

use snafu::{Backtrace, prelude::*};

use crate::storage::StorageError;

/// Errors raised while reading table or partition metadata.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MetadataError {
    /// Underlying storage error while reading metadata files.
    ///
    /// Backtraces are delegated to the inner StorageError.
    #[snafu(display("Storage error while reading table metadata: {source}"))]
    Storage {
        /// Underlying storage error returned by the filesystem.
        #[snafu(backtrace)]
        source: StorageError,
    },

    /// Metadata exists but is malformed or internally inconsistent.
    #[snafu(display("Corrupt table metadata at {path}: {msg}"))]
    CorruptState {
        /// The metadata file or directory at fault.
        path: String,
        /// A description of the corrupt state.
        msg: String,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },
}
