//! Object storage for hosted artifacts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::ArtifactReference;
use tokio::sync::RwLock;

use super::code_image::ImagePayload;
use crate::error::{ProvisioningError, Result};

/// Where and how an upload is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: String,
    pub public_id: String,
    /// Replace an existing object at the same path instead of failing.
    pub overwrite: bool,
}

impl UploadOptions {
    /// Returns the storage path, `folder/public_id`.
    pub fn path(&self) -> String {
        if self.folder.is_empty() {
            self.public_id.clone()
        } else {
            format!("{}/{}", self.folder.trim_end_matches('/'), self.public_id)
        }
    }
}

/// A stored object as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedObject {
    pub url: String,
    pub provider_id: String,
}

impl From<HostedObject> for ArtifactReference {
    fn from(object: HostedObject) -> Self {
        ArtifactReference {
            url: object.url,
            provider_id: object.provider_id,
        }
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Nothing was stored under the locator.
    NotFound,
}

/// Trait for object storage operations.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads a payload under `options.path()`.
    async fn upload(&self, payload: ImagePayload, options: &UploadOptions) -> Result<HostedObject>;

    /// Deletes an object by public URL or provider id.
    async fn delete(&self, locator: &str) -> Result<DeleteOutcome>;
}

#[derive(Debug, Default)]
struct InMemoryStorageState {
    objects: HashMap<String, ImagePayload>,
    uploads: usize,
    fail_on_upload: bool,
    fail_on_delete: bool,
}

/// In-memory object storage for testing and local runs.
#[derive(Debug, Clone)]
pub struct InMemoryObjectStorage {
    base_url: String,
    state: Arc<RwLock<InMemoryStorageState>>,
}

impl Default for InMemoryObjectStorage {
    fn default() -> Self {
        Self::new("memory://objects")
    }
}

impl InMemoryObjectStorage {
    /// Creates an empty storage serving objects under `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: Arc::new(RwLock::new(InMemoryStorageState::default())),
        }
    }

    /// Returns the public URL of a provider id.
    pub fn url_for(&self, provider_id: &str) -> String {
        format!("{}/{}", self.base_url, provider_id)
    }

    /// Stores an object directly, as if a client had uploaded it earlier.
    /// Returns its public URL.
    pub async fn seed(&self, provider_id: &str, payload: ImagePayload) -> String {
        self.state
            .write()
            .await
            .objects
            .insert(provider_id.to_string(), payload);
        self.url_for(provider_id)
    }

    /// Makes every subsequent `upload` call fail.
    pub async fn set_fail_on_upload(&self, fail: bool) {
        self.state.write().await.fail_on_upload = fail;
    }

    /// Makes every subsequent `delete` call fail.
    pub async fn set_fail_on_delete(&self, fail: bool) {
        self.state.write().await.fail_on_delete = fail;
    }

    /// Returns the number of stored objects.
    pub async fn object_count(&self) -> usize {
        self.state.read().await.objects.len()
    }

    /// Returns the number of successful uploads, overwrites included.
    pub async fn upload_count(&self) -> usize {
        self.state.read().await.uploads
    }

    /// Returns true if an object is stored under the URL or provider id.
    pub async fn contains(&self, locator: &str) -> bool {
        let provider_id = self.provider_id_of(locator);
        self.state.read().await.objects.contains_key(provider_id)
    }

    fn provider_id_of<'a>(&self, locator: &'a str) -> &'a str {
        locator
            .strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(locator)
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(&self, payload: ImagePayload, options: &UploadOptions) -> Result<HostedObject> {
        let mut state = self.state.write().await;

        if state.fail_on_upload {
            return Err(ProvisioningError::Storage("upload rejected".to_string()));
        }

        let provider_id = options.path();
        if !options.overwrite && state.objects.contains_key(&provider_id) {
            return Err(ProvisioningError::Storage(format!(
                "object already exists: {provider_id}"
            )));
        }

        state.objects.insert(provider_id.clone(), payload);
        state.uploads += 1;

        Ok(HostedObject {
            url: self.url_for(&provider_id),
            provider_id,
        })
    }

    async fn delete(&self, locator: &str) -> Result<DeleteOutcome> {
        let mut state = self.state.write().await;

        if state.fail_on_delete {
            return Err(ProvisioningError::Storage(format!(
                "delete rejected: {locator}"
            )));
        }

        let provider_id = self.provider_id_of(locator);
        match state.objects.remove(provider_id) {
            Some(_) => Ok(DeleteOutcome::Deleted),
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ImagePayload {
        ImagePayload {
            bytes: b"<svg/>".to_vec(),
            content_type: "image/svg+xml".to_string(),
        }
    }

    fn options(overwrite: bool) -> UploadOptions {
        UploadOptions {
            folder: "products".to_string(),
            public_id: "product_1".to_string(),
            overwrite,
        }
    }

    #[test]
    fn test_upload_path() {
        assert_eq!(options(true).path(), "products/product_1");
        let bare = UploadOptions {
            folder: String::new(),
            ..options(true)
        };
        assert_eq!(bare.path(), "product_1");
    }

    #[tokio::test]
    async fn test_upload_and_delete_by_url() {
        let storage = InMemoryObjectStorage::new("https://cdn.test/");
        let hosted = storage.upload(payload(), &options(true)).await.unwrap();

        assert_eq!(hosted.url, "https://cdn.test/products/product_1");
        assert_eq!(hosted.provider_id, "products/product_1");
        assert!(storage.contains(&hosted.url).await);

        let outcome = storage.delete(&hosted.url).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(storage.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_by_provider_id_and_missing() {
        let storage = InMemoryObjectStorage::default();
        storage.upload(payload(), &options(true)).await.unwrap();

        assert_eq!(
            storage.delete("products/product_1").await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            storage.delete("products/product_1").await.unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_object() {
        let storage = InMemoryObjectStorage::default();
        let first = storage.upload(payload(), &options(true)).await.unwrap();
        let second = storage.upload(payload(), &options(true)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.object_count().await, 1);
        assert_eq!(storage.upload_count().await, 2);
    }

    #[tokio::test]
    async fn test_no_overwrite_rejects_existing_path() {
        let storage = InMemoryObjectStorage::default();
        storage.upload(payload(), &options(false)).await.unwrap();

        let result = storage.upload(payload(), &options(false)).await;
        assert!(matches!(result, Err(ProvisioningError::Storage(_))));
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let storage = InMemoryObjectStorage::default();
        let url = storage.seed("docs/front", payload()).await;

        storage.set_fail_on_upload(true).await;
        assert!(storage.upload(payload(), &options(true)).await.is_err());

        storage.set_fail_on_delete(true).await;
        assert!(storage.delete(&url).await.is_err());
        assert!(storage.contains(&url).await);
    }
}
