//! Response body returned to clients for every stored file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stored_object::StoredObject;

/// File description as seen by HTTP clients.
///
/// `type` is set for create/update responses, `lastModified` for listings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub key: String,
    pub url: String,
    pub size: u64,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileData {
    /// Response for a freshly written object.
    pub fn written(object: StoredObject, url: String) -> Self {
        Self {
            key: object.key,
            url,
            size: object.size,
            content_type: object.content_type,
            last_modified: None,
        }
    }

    /// Response entry for a listed object.
    pub fn listed(object: StoredObject, url: String) -> Self {
        Self {
            key: object.key,
            url,
            size: object.size,
            content_type: None,
            last_modified: object.last_modified,
        }
    }
}
