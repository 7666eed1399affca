//! # Image Store Port
//!
//! Product images are uploaded before the product write; only the returned
//! reference is persisted.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Image upload errors.
#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("Image payload is empty")]
    Empty,

    #[error("Image upload failed: {0}")]
    Upload(String),
}

/// Stores raw image bytes and hands back a reference (usually a URL).
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>) -> Result<String, ImageStoreError>;
}

/// Process-local image store for tests and development.
#[derive(Debug)]
pub struct InMemoryImageStore {
    base_url: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryImageStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        InMemoryImageStore {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the bytes behind a reference handed out by `upload`.
    pub async fn get(&self, reference: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(reference).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryImageStore {
    fn default() -> Self {
        InMemoryImageStore::new("memory://images")
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn upload(&self, bytes: Vec<u8>) -> Result<String, ImageStoreError> {
        if bytes.is_empty() {
            return Err(ImageStoreError::Empty);
        }
        let reference = format!("{}/{}", self.base_url, Uuid::new_v4());
        self.objects.write().await.insert(reference.clone(), bytes);
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_returns_distinct_references() {
        let store = InMemoryImageStore::new("https://cdn.example/");
        let a = store.upload(vec![1, 2, 3]).await.unwrap();
        let b = store.upload(vec![4]).await.unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("https://cdn.example/"));
        assert_eq!(store.get(&a).await, Some(vec![1, 2, 3]));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let store = InMemoryImageStore::default();
        assert!(matches!(store.upload(Vec::new()).await, Err(ImageStoreError::Empty)));
        assert!(store.is_empty().await);
    }
}
