//! In-memory gateway for pipeline tests.

use super::StorageGateway;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone, Default)]
pub(crate) struct StoredObject {
    pub data: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

/// Records every object written; can be told to fail uploads for some keys.
#[derive(Default)]
pub(crate) struct MemoryGateway {
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_uploads_matching: Option<String>,
    pub upload_calls: AtomicU32,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every upload whose key ends with `suffix`.
    pub fn failing_uploads(suffix: &str) -> Self {
        Self {
            fail_uploads_matching: Some(suffix.to_string()),
            ..Self::default()
        }
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn uploads(&self) -> u32 {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageGateway for MemoryGateway {
    fn name(&self) -> &str {
        "memory"
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn upload(&self, key: &str, file: &mut tokio::fs::File, _len: u64) -> StorageResult<()> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(suffix) = &self.fail_uploads_matching {
            if key.ends_with(suffix.as_str()) {
                return Err(StorageError::Status {
                    url: key.to_string(),
                    status: 403,
                    message: "injected failure".to_string(),
                });
            }
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                metadata: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn set_metadata(
        &self,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> StorageResult<()> {
        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get_mut(key)
            .ok_or_else(|| StorageError::InvalidKey(format!("no object at {key}")))?;
        object.metadata = metadata.clone();
        Ok(())
    }
}
