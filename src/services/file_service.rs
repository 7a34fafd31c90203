//! FileService — the create/list/update/delete use cases behind `/files`.
//!
//! Composes key naming, the object store gateway and the CDN binding. It is
//! cloned into every handler as router state; all shared parts sit behind
//! `Arc` and are never mutated after startup.

use crate::models::{multipart::UploadedFile, stored_object::StoredObject};
use crate::services::cdn::{CdnBinding, CdnError};
use crate::services::naming::KeyStrategy;
use crate::services::object_store::{ObjectStore, StorageError};
use std::{fmt, str::FromStr, sync::Arc};
use thiserror::Error;
use tracing::{debug, info, warn};

const MAX_OBJECT_KEY_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum FileServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Cdn(#[from] CdnError),
    #[error("file `{0}` not found")]
    NotFound(String),
    #[error("invalid object key")]
    InvalidKey,
}

pub type FileServiceResult<T> = Result<T, FileServiceError>;

/// What `delete` does with the provider call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Await the provider and surface its failure.
    #[default]
    Await,
    /// Spawn the provider call and report success right away; failures are logged.
    Detach,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "await" => Ok(Self::Await),
            "detach" | "fire-and-forget" => Ok(Self::Detach),
            other => Err(format!(
                "unknown delete policy `{}` (expected `await` or `detach`)",
                other
            )),
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Await => f.write_str("await"),
            Self::Detach => f.write_str("detach"),
        }
    }
}

#[derive(Clone)]
pub struct FileService {
    pub store: Arc<dyn ObjectStore>,
    pub cdn: Arc<CdnBinding>,
    pub key_strategy: KeyStrategy,
    pub delete_policy: DeletePolicy,
}

impl FileService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        cdn: Arc<CdnBinding>,
        key_strategy: KeyStrategy,
        delete_policy: DeletePolicy,
    ) -> Self {
        Self {
            store,
            cdn,
            key_strategy,
            delete_policy,
        }
    }

    /// Public URL of `key` under the CDN (or bucket) base URL.
    pub fn public_url(&self, key: &str) -> String {
        self.cdn.url_for(key)
    }

    /// Store a new upload under a generated key.
    ///
    /// The key must pass the same checks as `update` and `delete`, so every
    /// stored file stays reachable through them.
    pub async fn upload(&self, file: UploadedFile) -> FileServiceResult<StoredObject> {
        let key = self
            .key_strategy
            .compute_key(&file.bytes, &file.original_filename);
        debug!(key = %key, filename = %file.original_filename, "computed key");
        ensure_key_safe(&key)?;

        let object = self
            .store
            .put(&key, file.bytes, file.content_type.as_deref())
            .await?;
        Ok(object)
    }

    /// Every object in the bucket, across all listing pages.
    pub async fn list(&self) -> FileServiceResult<Vec<StoredObject>> {
        Ok(self.store.list().await?)
    }

    /// Overwrite an existing object and invalidate its CDN path.
    ///
    /// Fails with `NotFound` without writing when the key does not exist.
    pub async fn update(&self, key: &str, file: UploadedFile) -> FileServiceResult<StoredObject> {
        ensure_key_safe(key)?;

        if !self.store.head(key).await? {
            return Err(FileServiceError::NotFound(key.to_string()));
        }

        let object = self
            .store
            .put(key, file.bytes, file.content_type.as_deref())
            .await?;

        if let Some(reference) = self.cdn.invalidate(key).await? {
            debug!(key = %key, reference = %reference, "invalidated updated file");
        }
        Ok(object)
    }

    /// Delete `key`. No existence check is made.
    pub async fn delete(&self, key: &str) -> FileServiceResult<()> {
        ensure_key_safe(key)?;

        match self.delete_policy {
            DeletePolicy::Await => {
                self.store.delete(key).await?;
                info!(key = %key, "deleted file");
            }
            DeletePolicy::Detach => {
                let store = self.store.clone();
                let key = key.to_string();
                tokio::spawn(async move {
                    match store.delete(&key).await {
                        Ok(()) => info!(key = %key, "deleted file"),
                        Err(err) => warn!(key = %key, error = %err, "detached delete failed"),
                    }
                });
            }
        }
        Ok(())
    }
}

/// Reject empty, oversized or absolute keys, `..` segments, and control bytes.
///
/// Dots inside a segment (`v1..2.txt`) are fine.
fn ensure_key_safe(key: &str) -> FileServiceResult<()> {
    if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
        return Err(FileServiceError::InvalidKey);
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(FileServiceError::InvalidKey);
    }
    if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
        return Err(FileServiceError::InvalidKey);
    }
    Ok(())
}
