//! Storage key derivation.
//!
//! Keys are either content-addressed (`base64url(sha1(bytes))`) or random
//! (`uuid v4`), and always keep the extension of the uploaded filename.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha1::{Digest, Sha1};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// How keys are generated for new uploads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Same bytes always map to the same key.
    #[default]
    ContentHash,
    /// Fresh UUID v4 per upload.
    Random,
}

impl FromStr for KeyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "content-hash" | "sha1" | "hash" => Ok(Self::ContentHash),
            "uuid" | "random" => Ok(Self::Random),
            other => Err(format!(
                "unknown key strategy `{}` (expected `content-hash` or `uuid`)",
                other
            )),
        }
    }
}

impl fmt::Display for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentHash => f.write_str("content-hash"),
            Self::Random => f.write_str("uuid"),
        }
    }
}

impl KeyStrategy {
    /// Compute the storage key for an upload. Performs no I/O.
    pub fn compute_key(self, bytes: &[u8], original_filename: &str) -> String {
        let stem = match self {
            Self::ContentHash => content_digest(bytes),
            Self::Random => Uuid::new_v4().to_string(),
        };
        format!("{}{}", stem, extension(original_filename))
    }
}

/// URL-safe, unpadded base64 of the SHA-1 digest.
pub fn content_digest(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(Sha1::digest(bytes))
}

/// Extension of the last path component, leading dot included.
///
/// Returns `""` when there is no dot, when the only dot starts the name
/// (`.env`), or when the name is made of dots only.
pub fn extension(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    if base.bytes().all(|b| b == b'.') {
        return "";
    }
    match base.rfind('.') {
        Some(0) | None => "",
        Some(pos) => &base[pos..],
    }
}
