//! Per-file upload steps: metadata, hash, key, conditional upload.

use std::path::Path;
use std::sync::Arc;

use crate::config::UploadConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::storage::StorageGateway;
use crate::types::{ItemOutcome, MediaFile};

use super::hash::Hasher;
use super::key::DestinationKey;
use super::metadata::MetadataExtractor;

/// Options for controlling upload behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Replace objects that already exist at the destination key
    pub overwrite: bool,
}

impl From<&UploadConfig> for ProcessOptions {
    fn from(config: &UploadConfig) -> Self {
        Self {
            overwrite: config.overwrite,
        }
    }
}

/// Runs one media file through extraction, hashing and upload.
pub struct UploadProcessor {
    gateway: Arc<dyn StorageGateway>,
    options: ProcessOptions,
}

impl UploadProcessor {
    pub fn new(gateway: Arc<dyn StorageGateway>, options: ProcessOptions) -> Self {
        Self { gateway, options }
    }

    /// Process a single file.
    ///
    /// The file handle is opened once, hashed, rewound and streamed to the
    /// gateway; it is closed on every return path when it drops.
    pub async fn process(&self, file: &MediaFile) -> PipelineResult<ItemOutcome> {
        let path = file.path.as_path();
        let start = std::time::Instant::now();
        tracing::debug!("Processing: {:?}", path);

        let metadata = MetadataExtractor::extract(path);
        tracing::trace!("  Metadata: {:?}", start.elapsed());

        let mut stream = tokio::fs::File::open(path)
            .await
            .map_err(|source| read_error(path, source))?;
        let len = stream
            .metadata()
            .await
            .map_err(|source| read_error(path, source))?
            .len();

        let hash_start = std::time::Instant::now();
        let digest = Hasher::digest_stream(&mut stream)
            .await
            .map_err(|source| PipelineError::Hash {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::trace!("  Content hash: {:?}", hash_start.elapsed());

        let key = DestinationKey::derive(&metadata, &digest, &file.extension);

        if !self.options.overwrite {
            let exists = self
                .gateway
                .exists(key.as_str())
                .await
                .map_err(|source| storage_error(path, "exists", source))?;
            if exists {
                return Ok(ItemOutcome::Skipped { key: key.into() });
            }
        }

        let upload_start = std::time::Instant::now();
        self.gateway
            .upload(key.as_str(), &mut stream, len)
            .await
            .map_err(|source| storage_error(path, "upload", source))?;
        tracing::trace!("  Upload: {:?}", upload_start.elapsed());

        let record = metadata.upload_record();
        self.gateway
            .set_metadata(key.as_str(), &record.to_map())
            .await
            .map_err(|source| storage_error(path, "set_metadata", source))?;

        tracing::debug!("Processed {:?} in {:?}", path, start.elapsed());
        Ok(ItemOutcome::Uploaded {
            key: key.into(),
            bytes: len,
        })
    }

    /// Name of the underlying gateway, for logs.
    pub fn gateway_name(&self) -> &str {
        self.gateway.name()
    }
}

fn read_error(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn storage_error(
    path: &Path,
    operation: &'static str,
    source: crate::error::StorageError,
) -> PipelineError {
    PipelineError::Storage {
        path: path.to_path_buf(),
        operation,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryGateway;
    use std::path::PathBuf;

    fn media(path: PathBuf, extension: &str) -> MediaFile {
        MediaFile {
            path,
            extension: extension.to_string(),
        }
    }

    #[test]
    fn test_process_options_default() {
        let options = ProcessOptions::default();
        assert!(!options.overwrite);
    }

    #[tokio::test]
    async fn test_uploads_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"pixels").unwrap();

        let gateway = Arc::new(MemoryGateway::new());
        let processor = UploadProcessor::new(gateway.clone(), ProcessOptions::default());
        let file = media(path, "jpg");

        let first = processor.process(&file).await.unwrap();
        let ItemOutcome::Uploaded { key, bytes } = first else {
            panic!("expected upload, got {first:?}");
        };
        assert_eq!(bytes, 6);
        assert!(key.ends_with(&format!("{}.jpg", Hasher::digest_bytes(b"pixels"))));

        let object = gateway.object(&key).unwrap();
        assert_eq!(object.data, b"pixels");
        assert_eq!(object.metadata["orientation"], "None");
        assert!(object.metadata.contains_key("date"));

        let second = processor.process(&file).await.unwrap();
        assert_eq!(second, ItemOutcome::Skipped { key });
        assert_eq!(gateway.uploads(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_uploads_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mov");
        std::fs::write(&path, b"frames").unwrap();

        let gateway = Arc::new(MemoryGateway::new());
        let processor =
            UploadProcessor::new(gateway.clone(), ProcessOptions { overwrite: true });
        let file = media(path, "mov");

        assert!(matches!(
            processor.process(&file).await.unwrap(),
            ItemOutcome::Uploaded { .. }
        ));
        assert!(matches!(
            processor.process(&file).await.unwrap(),
            ItemOutcome::Uploaded { .. }
        ));
        assert_eq!(gateway.uploads(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let gateway = Arc::new(MemoryGateway::new());
        let processor = UploadProcessor::new(gateway, ProcessOptions::default());
        let err = processor
            .process(&media(PathBuf::from("/nonexistent/a.jpg"), "jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/a.jpg"));
    }

    #[tokio::test]
    async fn test_gateway_failure_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.png");
        std::fs::write(&path, b"png").unwrap();

        let gateway = Arc::new(MemoryGateway::failing_uploads(".png"));
        let processor = UploadProcessor::new(gateway, ProcessOptions::default());
        let err = processor.process(&media(path, "png")).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Storage {
                operation: "upload",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_duplicate_content_shares_key() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("IMG_1.png");
        let b = dir.path().join("copy.PNG");
        std::fs::write(&a, b"same").unwrap();
        std::fs::write(&b, b"same").unwrap();

        let gateway = Arc::new(MemoryGateway::new());
        let processor = UploadProcessor::new(gateway.clone(), ProcessOptions::default());

        let first = processor.process(&media(a, "png")).await.unwrap();
        let second = processor.process(&media(b, "png")).await.unwrap();
        assert!(matches!(first, ItemOutcome::Uploaded { .. }));
        assert!(matches!(second, ItemOutcome::Skipped { .. }));
        assert_eq!(gateway.keys().len(), 1);
    }
}
