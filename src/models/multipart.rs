//! Represents a file received through a multipart upload.

use bytes::Bytes;

/// The `file` field of a multipart form, fully buffered.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Raw payload.
    pub bytes: Bytes,

    /// Filename as sent by the client (may be empty).
    pub original_filename: String,

    /// MIME type declared on the multipart field.
    pub content_type: Option<String>,
}

impl UploadedFile {
    pub fn new(
        bytes: impl Into<Bytes>,
        original_filename: impl Into<String>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            original_filename: original_filename.into(),
            content_type,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
