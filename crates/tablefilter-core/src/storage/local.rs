//! Local filesystem backend on top of `tokio::fs`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::fs;

use crate::path::TablePath;
use crate::storage::{
    BackendError, FileKind, FileStatus, FileSystem, FileSystemProvider, FileSystemRef,
    StorageConfig, StorageError, StorageResult,
};

/// Filesystem client for the local disk.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem {
    root: Option<PathBuf>,
}

impl LocalFileSystem {
    /// Client that maps table paths one-to-one onto local paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Client that resolves table paths underneath `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Map a table path onto the local disk.
    ///
    /// Qualified paths (anything other than `file://`) cannot be served
    /// locally and are rejected.
    pub fn to_local(&self, path: &TablePath) -> StorageResult<PathBuf> {
        if let Some(prefix) = path.prefix() {
            return Err(StorageError::from_backend(
                path.to_string(),
                BackendError::Local(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("scheme {prefix} is not served by the local filesystem"),
                )),
            ));
        }

        let mut abs = match &self.root {
            Some(root) => root.clone(),
            None => PathBuf::from("/"),
        };
        abs.extend(path.segments());
        Ok(abs)
    }
}

fn local_err(path: &TablePath, e: io::Error) -> StorageError {
    StorageError::from_backend(path.to_string(), BackendError::Local(e))
}

fn status_from_meta(path: TablePath, meta: &std::fs::Metadata) -> FileStatus {
    if meta.is_dir() {
        FileStatus {
            path,
            kind: FileKind::Directory,
            len: 0,
        }
    } else {
        FileStatus {
            path,
            kind: FileKind::File,
            len: meta.len(),
        }
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn list_dir(&self, dir: &TablePath) -> StorageResult<Vec<FileStatus>> {
        let abs = self.to_local(dir)?;
        let mut entries = fs::read_dir(&abs).await.map_err(|e| local_err(dir, e))?;

        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| local_err(dir, e))? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                // Table paths are UTF-8; nothing else can be addressed by callers.
                continue;
            };
            let child = dir.child_unchecked(name);

            // Follow symlinks so linked partitions behave like real directories.
            // A dangling link or an entry removed since `read_dir` is skipped.
            let meta = match fs::metadata(entry.path()).await {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("skipping vanished or dangling entry {child}");
                    continue;
                }
                Err(e) => return Err(local_err(&child, e)),
            };
            out.push(status_from_meta(child, &meta));
        }

        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    async fn stat(&self, path: &TablePath) -> StorageResult<FileStatus> {
        let abs = self.to_local(path)?;
        let meta = fs::metadata(&abs).await.map_err(|e| local_err(path, e))?;
        Ok(status_from_meta(path.clone(), &meta))
    }

    async fn read_to_string(&self, path: &TablePath) -> StorageResult<String> {
        let abs = self.to_local(path)?;
        fs::read_to_string(&abs)
            .await
            .map_err(|e| local_err(path, e))
    }
}

/// Provider that opens [`LocalFileSystem`] clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystemProvider;

#[async_trait]
impl FileSystemProvider for LocalFileSystemProvider {
    async fn open(&self, config: &StorageConfig) -> StorageResult<FileSystemRef> {
        let Some(root) = &config.root else {
            return Ok(Arc::new(LocalFileSystem::new()));
        };

        let meta = fs::metadata(root).await.map_err(|e| {
            StorageError::from_backend(root.display().to_string(), BackendError::Local(e))
        })?;
        if !meta.is_dir() {
            return Err(StorageError::from_backend(
                root.display().to_string(),
                BackendError::Local(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    "storage root is not a directory",
                )),
            ));
        }

        Ok(Arc::new(LocalFileSystem::with_root(root.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[tokio::test]
    async fn list_dir_returns_sorted_children_with_kinds() -> TestResult {
        let tmp = TempDir::new()?;
        tokio::fs::create_dir_all(tmp.path().join("t/sub")).await?;
        tokio::fs::write(tmp.path().join("t/b.txt"), b"bb").await?;
        tokio::fs::write(tmp.path().join("t/a.txt"), b"a").await?;

        let local = LocalFileSystem::with_root(tmp.path());
        let listing = local.list_dir(&TablePath::parse("/t")?).await?;

        let names: Vec<_> = listing.iter().filter_map(|s| s.path.name()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
        assert!(listing[0].is_file());
        assert_eq!(listing[1].len, 2);
        assert!(listing[2].is_dir());
        assert_eq!(listing[0].path.to_string(), "/t/a.txt");
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn list_dir_skips_dangling_symlinks() -> TestResult {
        let tmp = TempDir::new()?;
        tokio::fs::create_dir_all(tmp.path().join("t/linked_target")).await?;
        tokio::fs::write(tmp.path().join("t/a.txt"), b"a").await?;
        std::os::unix::fs::symlink(tmp.path().join("t/gone.txt"), tmp.path().join("t/broken"))?;
        std::os::unix::fs::symlink(
            tmp.path().join("t/linked_target"),
            tmp.path().join("t/linked"),
        )?;

        let local = LocalFileSystem::with_root(tmp.path());
        let listing = local.list_dir(&TablePath::parse("/t")?).await?;

        let names: Vec<_> = listing.iter().filter_map(|s| s.path.name()).collect();
        assert_eq!(names, vec!["a.txt", "linked", "linked_target"]);
        assert!(listing[1].is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn missing_paths_report_not_found() -> TestResult {
        let tmp = TempDir::new()?;
        let local = LocalFileSystem::with_root(tmp.path());
        let missing = TablePath::parse("/nope")?;

        let err = local.list_dir(&missing).await.expect_err("missing dir");
        assert!(err.is_not_found());
        assert_eq!(err.path(), "/nope");

        let err = local.stat(&missing).await.expect_err("missing path");
        assert!(err.is_not_found());

        let err = local
            .read_to_string(&missing)
            .await
            .expect_err("missing file");
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn read_to_string_and_stat_resolve_under_root() -> TestResult {
        let tmp = TempDir::new()?;
        tokio::fs::create_dir_all(tmp.path().join("a")).await?;
        tokio::fs::write(tmp.path().join("a/f.json"), "{}").await?;

        let local = LocalFileSystem::with_root(tmp.path());
        let path = TablePath::parse("/a/f.json")?;
        assert_eq!(local.read_to_string(&path).await?, "{}");
        assert!(local.stat(&path).await?.is_file());
        assert!(local.stat(&TablePath::parse("/a")?).await?.is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn qualified_paths_are_rejected() -> TestResult {
        let local = LocalFileSystem::new();
        let err = local
            .stat(&TablePath::parse("hdfs://nn/a")?)
            .await
            .expect_err("remote path");
        assert!(matches!(err, StorageError::OtherIo { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn provider_rejects_missing_root() -> TestResult {
        let tmp = TempDir::new()?;
        let config = StorageConfig {
            root: Some(tmp.path().join("missing")),
        };
        let err = LocalFileSystemProvider
            .open(&config)
            .await
            .expect_err("missing root");
        assert!(err.is_not_found());

        let config = StorageConfig {
            root: Some(tmp.path().to_path_buf()),
        };
        let fs = LocalFileSystemProvider.open(&config).await?;
        assert!(fs.list_dir(&TablePath::root()).await?.is_empty());
        Ok(())
    }
}
