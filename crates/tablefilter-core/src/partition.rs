//! Partition markers and the probe that reads them.
//!
//! Writers drop a `.partition_metadata` file into every partition directory
//! recording how many levels sit between that directory and the table root.
//! The probe only reads it; a directory without the file is unpartitioned
//! as far as the filter is concerned.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::layout;
use crate::path::TablePath;
use crate::storage::{self, FileSystem};
use crate::transaction_log::{CorruptStateSnafu, MetadataError, StorageSnafu};

/// Contents of a `.partition_metadata` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionMetadata {
    /// Number of levels from the partition directory up to the table root.
    pub partition_depth: u32,
    /// Commit that created the partition, when the writer recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_version: Option<u64>,
}

/// What a probe found in a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionProbeResult {
    /// No partition markers.
    Unpartitioned,
    /// Markers present; the table root is `depth` levels up.
    Partitioned {
        /// Levels between the directory and the table root.
        depth: u32,
    },
}

/// Reports partition markers of a directory.
#[async_trait]
pub trait PartitionProbe: Send + Sync + fmt::Debug {
    /// Whether `dir` carries partition markers.
    async fn has_markers(&self, fs: &dyn FileSystem, dir: &TablePath)
    -> Result<bool, MetadataError>;

    /// Depth recorded by the markers of `dir`. Only meaningful when
    /// [`has_markers`](Self::has_markers) returned `true`.
    async fn read_depth(&self, fs: &dyn FileSystem, dir: &TablePath) -> Result<u32, MetadataError>;

    /// Combined check: markers first, then their depth.
    async fn probe(
        &self,
        fs: &dyn FileSystem,
        dir: &TablePath,
    ) -> Result<PartitionProbeResult, MetadataError> {
        if !self.has_markers(fs, dir).await? {
            return Ok(PartitionProbeResult::Unpartitioned);
        }
        let depth = self.read_depth(fs, dir).await?;
        Ok(PartitionProbeResult::Partitioned { depth })
    }
}

/// [`PartitionProbe`] backed by `.partition_metadata` JSON files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionMarkerProbe;

impl PartitionMarkerProbe {
    /// Read and parse the marker file of `dir`.
    pub async fn read_metadata(
        fs: &dyn FileSystem,
        dir: &TablePath,
    ) -> Result<PartitionMetadata, MetadataError> {
        let path = layout::partition_metadata_path(dir);
        let contents = fs.read_to_string(&path).await.context(StorageSnafu)?;

        serde_json::from_str(&contents).map_err(|e| {
            CorruptStateSnafu {
                path: path.to_string(),
                msg: format!("invalid partition metadata: {e}"),
            }
            .build()
        })
    }
}

#[async_trait]
impl PartitionProbe for PartitionMarkerProbe {
    async fn has_markers(
        &self,
        fs: &dyn FileSystem,
        dir: &TablePath,
    ) -> Result<bool, MetadataError> {
        let path = layout::partition_metadata_path(dir);
        let status = storage::stat_opt(fs, &path).await.context(StorageSnafu)?;
        Ok(status.is_some_and(|s| s.is_file()))
    }

    async fn read_depth(&self, fs: &dyn FileSystem, dir: &TablePath) -> Result<u32, MetadataError> {
        Ok(Self::read_metadata(fs, dir).await?.partition_depth)
    }
}
