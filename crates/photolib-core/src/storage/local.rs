//! Local filesystem gateway.
//!
//! Objects live at `{root}/{container}/{key}` with their metadata in a
//! `{object}.metadata.json` sidecar. Selected with a `file://` endpoint.

use super::{key_segments, StorageGateway};
use crate::error::StorageResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Suffix of the metadata sidecar written next to each object.
const METADATA_SUFFIX: &str = ".metadata.json";

/// Distinguishes concurrent in-progress writes to the same key.
static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Directory-backed object store.
#[derive(Clone)]
pub struct LocalGateway {
    base_path: PathBuf,
}

impl LocalGateway {
    /// Create a gateway storing objects under `root/container`.
    pub fn new(root: impl Into<PathBuf>, container: &str) -> Self {
        Self {
            base_path: root.into().join(container),
        }
    }

    /// Filesystem path of the object at `key`.
    pub fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        let mut path = self.base_path.clone();
        path.extend(key_segments(key)?);
        Ok(path)
    }

    fn metadata_path(&self, key: &str) -> StorageResult<PathBuf> {
        let mut path = self.object_path(key)?.into_os_string();
        path.push(METADATA_SUFFIX);
        Ok(PathBuf::from(path))
    }

    /// Read back the metadata attached to `key`, if any.
    pub async fn read_metadata(&self, key: &str) -> StorageResult<Option<HashMap<String, String>>> {
        let path = self.metadata_path(key)?;
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = fs::read(&path).await?;
        Ok(Some(serde_json::from_slice(&content)?))
    }
}

#[async_trait]
impl StorageGateway for LocalGateway {
    fn name(&self) -> &str {
        "local"
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(fs::try_exists(self.object_path(key)?).await?)
    }

    async fn upload(&self, key: &str, file: &mut tokio::fs::File, len: u64) -> StorageResult<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a temp name first so a failed copy never leaves a
        // truncated object that a later run would skip as existing.
        let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut partial = path.clone().into_os_string();
        partial.push(format!(".{}.{seq}.partial", std::process::id()));
        let partial = PathBuf::from(partial);

        file.seek(SeekFrom::Start(0)).await?;
        let mut out = fs::File::create(&partial).await?;
        let copied = tokio::io::copy(file, &mut out).await?;
        out.flush().await?;
        drop(out);

        if copied != len {
            tracing::debug!("Expected {len} bytes for {key}, copied {copied}");
        }
        if let Err(e) = fs::rename(&partial, &path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn set_metadata(
        &self,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> StorageResult<()> {
        let path = self.metadata_path(key)?;
        let content = serde_json::to_vec_pretty(metadata)?;
        fs::write(path, content).await?;
        Ok(())
    }
}
