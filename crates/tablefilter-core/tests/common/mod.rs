#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tablefilter_core::layout;
use tablefilter_core::storage::{MemoryFileSystem, StorageConfig};
use tablefilter_core::{FilterConfig, TablePath, TablePathFilter};
use tempfile::TempDir;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn p(s: &str) -> TablePath {
    TablePath::parse(s).expect("valid test path")
}

/// Writes table layouts into a backend.
pub trait LakeWriter {
    fn write(&self, path: &TablePath, contents: &str) -> TestResult;
    fn mkdir(&self, path: &TablePath) -> TestResult;

    /// `.table_log` with the given commit files and `CURRENT` pointer.
    fn table(&self, root: &TablePath, current: Option<u64>, commits: &[u64]) -> TestResult {
        let log_dir = root.child(layout::METAFOLDER_NAME)?;
        self.mkdir(&log_dir)?;
        for v in commits {
            self.write(&log_dir.child(&layout::commit_file_name(*v))?, "{}")?;
        }
        if let Some(current) = current {
            self.write(&log_dir.child(layout::CURRENT_FILE_NAME)?, &format!("{current}\n"))?;
        }
        Ok(())
    }

    fn partition_marker(&self, dir: &TablePath, depth: u32) -> TestResult {
        self.write(
            &dir.child(layout::PARTITION_METADATA_FILE)?,
            &format!(r#"{{"partition_depth": {depth}}}"#),
        )
    }

    fn data_files(&self, dir: &TablePath, names: &[&str]) -> TestResult {
        for name in names {
            self.write(&dir.child(name)?, "")?;
        }
        Ok(())
    }
}

impl LakeWriter for MemoryFileSystem {
    fn write(&self, path: &TablePath, contents: &str) -> TestResult {
        self.put_file(path, contents);
        Ok(())
    }

    fn mkdir(&self, path: &TablePath) -> TestResult {
        self.create_dir(path);
        Ok(())
    }
}

/// A temporary local directory that table paths are resolved under.
pub struct LocalLake {
    tmp: TempDir,
}

impl LocalLake {
    pub fn new() -> TestResult<Self> {
        Ok(Self {
            tmp: TempDir::new()?,
        })
    }

    pub fn root_dir(&self) -> PathBuf {
        self.tmp.path().to_path_buf()
    }

    pub fn config(&self) -> FilterConfig {
        FilterConfig {
            storage: StorageConfig {
                root: Some(self.root_dir()),
            },
            ..FilterConfig::default()
        }
    }

    pub fn filter(&self) -> TablePathFilter {
        TablePathFilter::from_config(&self.config())
    }

    fn local(&self, path: &TablePath) -> PathBuf {
        let mut out = self.root_dir();
        out.extend(path.segments());
        out
    }
}

impl LakeWriter for LocalLake {
    fn write(&self, path: &TablePath, contents: &str) -> TestResult {
        let local = self.local(path);
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(local, contents)?;
        Ok(())
    }

    fn mkdir(&self, path: &TablePath) -> TestResult {
        std::fs::create_dir_all(self.local(path))?;
        Ok(())
    }
}

pub fn memory_filter(fs: &MemoryFileSystem) -> TablePathFilter {
    TablePathFilter::new(Arc::new(fs.clone()), StorageConfig::default())
}

/// `/d/p1/p2/p3` table with one partition directory holding two versions of
/// `fileA` and one of `fileB`, all committed.
pub fn sample_table(lake: &impl LakeWriter) -> TestResult<TablePath> {
    let root = p("/d/p1/p2/p3");
    lake.table(&root, Some(2), &[1, 2])?;
    let part = p("/d/p1/p2/p3/partA");
    lake.partition_marker(&part, 1)?;
    lake.data_files(
        &part,
        &[
            "fileA_w1_0000000001.parquet",
            "fileA_w1_0000000002.parquet",
            "fileB_w1_0000000001.parquet",
        ],
    )?;
    Ok(part)
}
