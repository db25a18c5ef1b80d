//! Filter and scan configuration.
//!
//! ```json
//! {
//!   "storage": { "root": "/srv/lake" },
//!   "scan": { "concurrency": 16, "recursive": true }
//! }
//! ```
//!
//! Every field is optional; missing ones take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snafu::{Backtrace, prelude::*};

use crate::storage::StorageConfig;

/// Files checked concurrently by the scanner when not configured.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 8;

/// Errors raised while loading configuration.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[snafu(display("Failed to read config file {}: {source}", path.display()))]
    ReadConfig {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// The configuration is not valid JSON for [`FilterConfig`].
    #[snafu(display("Invalid config {origin}: {source}"))]
    ParseConfig {
        /// Where the configuration came from.
        origin: String,
        /// Underlying JSON error.
        source: serde_json::Error,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },
}

/// Options of [`scan::list_visible_files`](crate::scan::list_visible_files).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Maximum number of `accept` calls in flight.
    pub concurrency: usize,
    /// Descend into subdirectories.
    pub recursive: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_SCAN_CONCURRENCY,
            recursive: false,
        }
    }
}

/// Top-level configuration of a filter and its scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Filesystem settings.
    pub storage: StorageConfig,
    /// Scanner settings.
    pub scan: ScanConfig,
}

impl FilterConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).context(ParseConfigSnafu { origin: "<string>" })
    }

    /// Read and parse a JSON file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .context(ReadConfigSnafu { path })?;
        serde_json::from_str(&contents).context(ParseConfigSnafu {
            origin: path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn empty_document_yields_defaults() -> TestResult {
        let config = FilterConfig::from_json_str("{}")?;
        assert_eq!(config, FilterConfig::default());
        assert_eq!(config.scan.concurrency, DEFAULT_SCAN_CONCURRENCY);
        assert!(!config.scan.recursive);
        assert_eq!(config.storage.root, None);
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = FilterConfig::from_json_str(r#"{"scan": {"threads": 2}}"#)
            .expect_err("unknown field");
        assert!(matches!(err, ConfigError::ParseConfig { .. }));
    }

    #[tokio::test]
    async fn reads_json_file() -> TestResult {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("tfilter.json");
        tokio::fs::write(
            &path,
            r#"{"storage": {"root": "/srv/lake"}, "scan": {"recursive": true}}"#,
        )
        .await?;

        let config = FilterConfig::from_json_file(&path).await?;
        assert_eq!(config.storage.root, Some(PathBuf::from("/srv/lake")));
        assert!(config.scan.recursive);
        assert_eq!(config.scan.concurrency, DEFAULT_SCAN_CONCURRENCY);
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() -> TestResult {
        let tmp = TempDir::new()?;
        let err = FilterConfig::from_json_file(tmp.path().join("absent.json"))
            .await
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::ReadConfig { .. }));
        Ok(())
    }
}
