use std::{error::Error, fmt, io};

use snafu::{Backtrace, IntoError, prelude::*};

/// Errors produced by a concrete filesystem backend.
///
/// Backend-specific I/O errors are wrapped here so higher layers can map them
/// into [`StorageError`] variants with path context.
#[derive(Debug)]
pub enum BackendError {
    /// A local filesystem I/O error.
    Local(io::Error),
    /// An error raised by the in-memory backend.
    Memory(io::Error),
}

impl BackendError {
    /// The `io::ErrorKind` of the wrapped error.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            BackendError::Local(e) | BackendError::Memory(e) => e.kind(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Local(e) => write!(f, "local I/O error: {e}"),
            BackendError::Memory(e) => write!(f, "in-memory filesystem error: {e}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Local(e) | BackendError::Memory(e) => Some(e),
        }
    }
}

/// Errors that can occur during filesystem operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// The specified path was not found.
    #[snafu(display("Path not found: {path}"))]
    NotFound {
        /// The path that was not found.
        path: String,
        /// Underlying backend error that caused the failure.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The caller is not allowed to access the path.
    #[snafu(display("Permission denied: {path}"))]
    PermissionDenied {
        /// The path that could not be accessed.
        path: String,
        /// Underlying backend error that caused the failure.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Any other I/O failure (connectivity, not-a-directory, ...).
    #[snafu(display("I/O error at {path}: {source}"))]
    OtherIo {
        /// The path where the I/O error occurred.
        path: String,
        /// Underlying backend error with platform-specific details.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

impl StorageError {
    /// Build the variant matching the backend error's kind.
    pub fn from_backend(path: impl Into<String>, err: BackendError) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => NotFoundSnafu { path }.into_error(err),
            io::ErrorKind::PermissionDenied => PermissionDeniedSnafu { path }.into_error(err),
            _ => OtherIoSnafu { path }.into_error(err),
        }
    }

    /// The path the failing operation was working on.
    pub fn path(&self) -> &str {
        match self {
            StorageError::NotFound { path, .. }
            | StorageError::PermissionDenied { path, .. }
            | StorageError::OtherIo { path, .. } => path,
        }
    }

    /// Whether this error reports a missing path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
