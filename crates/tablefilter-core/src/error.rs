//! Error types and SNAFU context selectors for the path filter.
//!
//! [`ClassifyError`] names what went wrong inside one classification;
//! [`PathFilterError`] is what `accept` returns and pins that cause to the
//! path under test and the directory being classified. Callers that need to
//! branch use [`PathFilterError::kind`] instead of matching on the chain.

use snafu::{IntoError, prelude::*};

use crate::path::PathError;
use crate::storage::StorageError;
use crate::transaction_log::MetadataError;

/// Category of a fatal classification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The path itself is unusable (unparsable, or has no parent).
    MalformedInput,
    /// Partition markers or table metadata exist but are inconsistent.
    MalformedMetadata,
    /// The filesystem reported an I/O failure.
    FilesystemFailure,
}

/// Failures raised while classifying a single path.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClassifyError {
    /// The path has no derivable parent directory.
    #[snafu(display("Malformed input path: {msg}"))]
    MalformedInput {
        /// What is wrong with the path.
        msg: String,
    },

    /// The path string could not be parsed.
    #[snafu(display("Invalid path: {source}"))]
    InvalidPath {
        /// Underlying parse error.
        #[snafu(source, backtrace)]
        source: PathError,
    },

    /// Reading partition markers or the table's commit log failed.
    #[snafu(display("Table metadata error: {source}"))]
    Metadata {
        /// Underlying metadata error.
        #[snafu(source, backtrace)]
        source: MetadataError,
    },

    /// Listing the directory under classification failed.
    #[snafu(display("Failed to list {dir}: {source}"))]
    Listing {
        /// The directory that could not be listed.
        dir: String,
        /// Underlying storage error.
        #[snafu(source, backtrace)]
        source: StorageError,
    },

    /// The filesystem handle could not be created.
    #[snafu(display("Failed to open the filesystem: {source}"))]
    OpenFileSystem {
        /// Underlying storage error from the provider.
        #[snafu(source, backtrace)]
        source: StorageError,
    },
}

impl ClassifyError {
    /// Category of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifyError::MalformedInput { .. } | ClassifyError::InvalidPath { .. } => {
                ErrorKind::MalformedInput
            }
            ClassifyError::Metadata {
                source: MetadataError::CorruptState { .. },
            } => ErrorKind::MalformedMetadata,
            ClassifyError::Metadata {
                source: MetadataError::Storage { .. },
            }
            | ClassifyError::Listing { .. }
            | ClassifyError::OpenFileSystem { .. } => ErrorKind::FilesystemFailure,
        }
    }
}

/// Fatal error returned by [`TablePathFilter::accept`](crate::TablePathFilter::accept).
#[derive(Debug, Snafu)]
#[snafu(display(
    "Error checking path {path}{}: {source}",
    folder.as_ref().map(|f| format!(" under folder {f}")).unwrap_or_default()
))]
pub struct PathFilterError {
    path: String,
    folder: Option<String>,
    #[snafu(source, backtrace)]
    source: ClassifyError,
}

impl PathFilterError {
    pub(crate) fn new(
        path: impl Into<String>,
        folder: Option<String>,
        source: ClassifyError,
    ) -> Self {
        PathFilterSnafu {
            path: path.into(),
            folder,
        }
        .into_error(source)
    }

    /// The path under test.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The directory being classified, when one was derived.
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Category of the failure.
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// The underlying cause.
    pub fn cause(&self) -> &ClassifyError {
        &self.source
    }
}

/// Result alias used by the filter's public API.
pub type PathFilterResult<T> = Result<T, PathFilterError>;
