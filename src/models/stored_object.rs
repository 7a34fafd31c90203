//! Represents an object (file) stored in the bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single object held by the object store.
///
/// Only metadata is kept here; the payload bytes live in the bucket.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// Object key, unique within the bucket.
    pub key: String,

    /// Size in bytes.
    pub size: u64,

    /// Content type (MIME type), when known.
    pub content_type: Option<String>,

    /// Timestamp when the object was last written, as reported by the provider.
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a provider listing.
#[derive(Clone, Debug, Default)]
pub struct ObjectPage {
    pub objects: Vec<StoredObject>,
    pub next_continuation_token: Option<String>,
    pub is_truncated: bool,
}
