//! Mock Asset Gateway Implementation
//!
//! Keeps uploaded objects in memory and hands out deterministic
//! fake signed URLs. Thread-safe via `Arc<Mutex<>>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::{parse_asset_ref, AssetGateway, AssetRef, StorageError};

/// Object captured by the mock gateway
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub path: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// In-memory asset gateway for tests and local runs
#[derive(Debug, Clone)]
pub struct MockAssetGateway {
    bucket: String,
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    fail_uploads: Arc<RwLock<bool>>,
}

impl MockAssetGateway {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(HashMap::new())),
            fail_uploads: Arc::new(RwLock::new(false)),
        }
    }

    /// Make subsequent uploads fail (simulates an unreachable bucket)
    pub fn set_fail_uploads(&self, fail: bool) {
        *self.fail_uploads.write().unwrap() = fail;
    }

    /// Look up a stored object by path
    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Clear stored objects and restore default behavior
    pub fn reset(&self) {
        self.objects.lock().unwrap().clear();
        *self.fail_uploads.write().unwrap() = false;
    }
}

#[async_trait::async_trait]
impl AssetGateway for MockAssetGateway {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        path: &str,
        content_type: &str,
    ) -> Result<AssetRef, StorageError> {
        let fail = *self
            .fail_uploads
            .read()
            .map_err(|e| StorageError::UploadFailed(format!("behavior lock poisoned: {e}")))?;
        if fail {
            return Err(StorageError::UploadFailed(
                "mock storage configured to fail".to_string(),
            ));
        }

        tracing::debug!(path = %path, size = bytes.len(), "Mock storage: recording upload");
        self.objects
            .lock()
            .map_err(|e| StorageError::UploadFailed(format!("objects lock poisoned: {e}")))?
            .insert(
                path.to_string(),
                StoredObject {
                    path: path.to_string(),
                    content_type: content_type.to_string(),
                    bytes,
                },
            );

        Ok(format!("mock://{}/{}", self.bucket, path))
    }

    async fn signed_url(&self, reference: &str, ttl: Duration) -> Option<String> {
        // Any well-formed reference signs, including provider outputs like gs://
        let (_, bucket, key) = parse_asset_ref(reference)?;
        Some(format!(
            "https://storage.mock.local/{}/{}?expires_in={}",
            bucket,
            key,
            ttl.as_secs()
        ))
    }
}
