use super::{ObjectStore, StorageError, StorageResult};
use crate::models::stored_object::{ObjectPage, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Page size the provider uses when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Clone, Debug)]
struct Entry {
    object: StoredObject,
    bytes: Bytes,
}

/// In-process bucket.
///
/// Listing is paginated with the last returned key as continuation token, so
/// callers see the same truncation behavior as a real provider. Clones share
/// the same contents and counters.
#[derive(Clone)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<BTreeMap<String, Entry>>>,
    page_size: usize,
    fail_puts: bool,
    fail_lists: bool,
    fail_heads: bool,
    fail_deletes: bool,
    put_count: Arc<AtomicUsize>,
    head_count: Arc<AtomicUsize>,
    delete_count: Arc<AtomicUsize>,
    list_page_count: Arc<AtomicUsize>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            page_size: DEFAULT_PAGE_SIZE,
            fail_puts: false,
            fail_lists: false,
            fail_heads: false,
            fail_deletes: false,
            put_count: Arc::new(AtomicUsize::new(0)),
            head_count: Arc::new(AtomicUsize::new(0)),
            delete_count: Arc::new(AtomicUsize::new(0)),
            list_page_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every put fail.
    pub fn with_failing_puts(mut self) -> Self {
        self.fail_puts = true;
        self
    }

    /// Make every list page request fail.
    pub fn with_failing_lists(mut self) -> Self {
        self.fail_lists = true;
        self
    }

    /// Make every existence check fail (not the same as "not found").
    pub fn with_failing_heads(mut self) -> Self {
        self.fail_heads = true;
        self
    }

    /// Make every delete fail.
    pub fn with_failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn with_object(self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Self {
        self.insert(key, Bytes::copy_from_slice(bytes), content_type);
        self
    }

    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    pub fn head_count(&self) -> usize {
        self.head_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    pub fn list_page_count(&self) -> usize {
        self.list_page_count.load(Ordering::SeqCst)
    }

    /// Stored payload for `key`, if any.
    pub fn bytes(&self, key: &str) -> Option<Bytes> {
        self.lock().get(key).map(|entry| entry.bytes.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Entry>> {
        // A poisoned map still holds consistent entries; every write is a single insert/remove.
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, key: &str, bytes: Bytes, content_type: Option<&str>) -> StoredObject {
        let object = StoredObject {
            key: key.to_string(),
            size: bytes.len() as u64,
            content_type: content_type.map(str::to_string),
            last_modified: Some(Utc::now()),
        };
        self.lock().insert(
            key.to_string(),
            Entry {
                object: object.clone(),
                bytes,
            },
        );
        object
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<StoredObject> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts {
            return Err(StorageError::Put {
                key: key.to_string(),
                message: "put rejected by memory store".into(),
            });
        }
        Ok(self.insert(key, bytes, content_type))
    }

    async fn list_page(&self, continuation_token: Option<String>) -> StorageResult<ObjectPage> {
        self.list_page_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists {
            return Err(StorageError::List("list rejected by memory store".into()));
        }
        let objects = self.lock();

        let mut remaining = objects
            .iter()
            .filter(|(key, _)| match continuation_token.as_deref() {
                Some(token) => key.as_str() > token,
                None => true,
            })
            .map(|(_, entry)| entry.object.clone());

        let page: Vec<StoredObject> = remaining.by_ref().take(self.page_size).collect();
        let is_truncated = remaining.next().is_some();
        let next_continuation_token = if is_truncated {
            page.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            objects: page,
            next_continuation_token,
            is_truncated,
        })
    }

    async fn head(&self, key: &str) -> StorageResult<bool> {
        self.head_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_heads {
            return Err(StorageError::Head {
                key: key.to_string(),
                message: "head rejected by memory store".into(),
            });
        }
        Ok(self.lock().contains_key(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Err(StorageError::Delete {
                key: key.to_string(),
                message: "delete rejected by memory store".into(),
            });
        }
        self.lock().remove(key);
        Ok(())
    }
}
