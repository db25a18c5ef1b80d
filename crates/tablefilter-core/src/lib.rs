//! Read-optimized path filter for append-only, versioned tables.
//!
//! A managed table keeps several physical versions of every logical file
//! group and a commit log (`.table_log/`) recording which commits completed.
//! Query engines that list such a table directly would see every version;
//! [`TablePathFilter`] hides all but the latest completed version of each
//! group while letting files of ordinary directories through untouched.
//!
//! The crate is organized leaves first:
//!
//! - Filesystem abstraction with local and in-memory backends (`storage`).
//! - Normalized paths and on-disk naming conventions (`path`, `layout`).
//! - Read-only access to the commit log and partition markers
//!   (`transaction_log`, `partition`).
//! - The classification engine: directory cache, root discovery and
//!   latest-version resolution (`cache`, `locator`, `resolver`), tied
//!   together by the filter itself (`filter`).
//! - A directory scanner and JSON configuration for hosts (`scan`, `config`).
//!
//! The filter never writes table metadata and never retries filesystem
//! failures; both are the job of the table's writers and of the filesystem
//! client respectively.
#![deny(missing_docs)]
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod layout;
pub mod locator;
pub mod partition;
pub mod path;
pub mod resolver;
pub mod scan;
pub mod storage;
pub mod transaction_log;

pub use cache::{CacheLookup, DirectoryClassificationCache, DirectoryKey};
pub use config::{FilterConfig, ScanConfig};
pub use error::{ErrorKind, PathFilterError, PathFilterResult};
pub use filter::TablePathFilter;
pub use path::TablePath;
pub use scan::{ScanReport, list_visible_files};
