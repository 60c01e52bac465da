//! Storage gateways: the boundary to the remote object store.
//!
//! The pipeline only needs three operations: an existence check, a full
//! upload, and attaching key/value metadata. Implementations:
//! - **datalake**: Azure Data Lake Storage Gen2 over its REST API
//! - **local**: a directory on disk, for dry runs and tests

pub mod datalake;
pub mod local;
pub mod retry;

#[cfg(test)]
pub(crate) mod memory;

pub use datalake::{Credential, DataLakeGateway};
pub use local::LocalGateway;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

/// Operations the upload pipeline performs against the object store.
///
/// Keys are destination keys of the form `/yyyy/MM/dd/<digest>.<ext>`.
/// Uses `async_trait` so gateways can be shared as `Arc<dyn StorageGateway>`.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Gateway name for logging (e.g., "datalake", "local").
    fn name(&self) -> &str;

    /// Check whether an object exists at `key`.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Write the full contents of `file` (`len` bytes, positioned at the
    /// start) to `key`, replacing any existing object.
    async fn upload(&self, key: &str, file: &mut tokio::fs::File, len: u64) -> StorageResult<()>;

    /// Attach key/value metadata to the object at `key`.
    async fn set_metadata(&self, key: &str, metadata: &HashMap<String, String>)
        -> StorageResult<()>;
}

/// Build the gateway selected by the endpoint URL scheme.
///
/// `file://` endpoints map to a [`LocalGateway`]; anything else is treated as
/// a Data Lake account using credentials discovered from the environment.
pub fn gateway_from_config(config: &StorageConfig) -> StorageResult<Arc<dyn StorageGateway>> {
    let endpoint = reqwest::Url::parse(&config.endpoint)
        .map_err(|e| StorageError::Config(format!("invalid endpoint {}: {e}", config.endpoint)))?;

    if endpoint.scheme() == "file" {
        let root = endpoint
            .to_file_path()
            .map_err(|_| StorageError::Config(format!("invalid file URL {endpoint}")))?;
        tracing::debug!("Using local storage at {:?}", root);
        return Ok(Arc::new(LocalGateway::new(root, &config.container)));
    }

    let credential = Credential::from_env(|key| std::env::var(key).ok());
    let gateway = DataLakeGateway::new(config, credential)?;
    tracing::debug!("Using Data Lake storage at {}", endpoint);
    Ok(Arc::new(gateway))
}

/// Split a destination key into path segments, rejecting traversal.
pub(crate) fn key_segments(key: &str) -> StorageResult<Vec<&str>> {
    let segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() || segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(segments)
}
