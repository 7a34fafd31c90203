//! Object store gateway.
//!
//! `ObjectStore` is the seam between the file service and the bucket. The S3
//! implementation talks to the provider; the in-memory one backs tests and
//! local runs.

pub mod memory;
pub mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

use crate::models::stored_object::{ObjectPage, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to put object `{key}`: {message}")]
    Put { key: String, message: String },
    #[error("failed to list objects: {0}")]
    List(String),
    #[error("failed to stat object `{key}`: {message}")]
    Head { key: String, message: String },
    #[error("failed to delete object `{key}`: {message}")]
    Delete { key: String, message: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing object.
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<StoredObject>;

    /// Fetch a single listing page starting at `continuation_token`.
    async fn list_page(&self, continuation_token: Option<String>) -> StorageResult<ObjectPage>;

    /// Whether `key` exists. A provider "not found" is `Ok(false)`.
    async fn head(&self, key: &str) -> StorageResult<bool>;

    /// Remove `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// List every object in the bucket.
    ///
    /// Pages are requested one after another, each with the token returned by
    /// the previous page, until the provider reports the listing complete.
    async fn list(&self) -> StorageResult<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut token = None;
        let mut pages = 0usize;

        loop {
            let page = self.list_page(token.take()).await?;
            pages += 1;
            objects.extend(page.objects);

            if !page.is_truncated {
                break;
            }
            match page.next_continuation_token {
                Some(next) => token = Some(next),
                None => {
                    return Err(StorageError::List(
                        "truncated page without continuation token".into(),
                    ));
                }
            }
        }

        debug!(pages, objects = objects.len(), "listed bucket");
        Ok(objects)
    }
}
