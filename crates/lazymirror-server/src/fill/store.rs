//! Local store: the directory tree the static-file stage serves from.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use lazymirror_core::error::Result;
use lazymirror_core::protocol::ResourcePath;

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Append-only file store mirroring request paths under `root`.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    index_document: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, index_document: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index_document: index_document.into(),
        }
    }

    /// Validate a request path against this store's layout.
    pub fn resolve(&self, request_path: &str) -> Result<ResourcePath> {
        ResourcePath::parse(request_path, &self.index_document)
    }

    pub fn path_of(&self, res: &ResourcePath) -> PathBuf {
        res.local_path(&self.root)
    }

    /// Whether a cache entry exists for `res`.
    pub async fn contains(&self, res: &ResourcePath) -> bool {
        tokio::fs::metadata(self.path_of(res))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Write a new cache entry.
    ///
    /// Parent directories are created on demand. Bytes land in a temp file
    /// next to the target and are renamed into place, so the static stage
    /// never serves a partially written entry.
    pub async fn write(&self, res: &ResourcePath, data: &[u8]) -> Result<PathBuf> {
        let path = self.path_of(res);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = temp_path(&path);
        if let Err(e) = write_then_rename(&tmp, &path, data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(path)
    }
}

async fn write_then_rename(tmp: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    tokio::fs::write(tmp, data).await?;
    tokio::fs::rename(tmp, path).await
}

fn temp_path(path: &Path) -> PathBuf {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(format!(".{}-{seq}.part", std::process::id()));
    path.with_file_name(name)
}
