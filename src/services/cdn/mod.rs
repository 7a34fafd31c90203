//! CDN binding.
//!
//! The distribution's public domain is looked up once during startup and held
//! in a [`CdnBinding`] that every handler reads through the router state.
//! Updates of existing objects invalidate the object's path at the CDN.

pub mod cloudfront;
pub mod mock;

pub use cloudfront::CloudFrontProvider;
pub use mock::MockCdnProvider;

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::info;
use url::Url;

#[derive(Debug, Error)]
pub enum CdnError {
    #[error("failed to resolve distribution `{id}`: {message}")]
    Resolve { id: String, message: String },
    #[error("failed to invalidate `{path}` on distribution `{id}`: {message}")]
    Invalidate {
        id: String,
        path: String,
        message: String,
    },
    #[error("invalid CDN base url `{0}`")]
    InvalidBaseUrl(String),
}

pub type CdnResult<T> = Result<T, CdnError>;

#[async_trait]
pub trait CdnProvider: Send + Sync {
    /// Public domain name served by the distribution, e.g. `d111.cloudfront.net`.
    async fn distribution_domain(&self, distribution_id: &str) -> CdnResult<String>;

    /// Request invalidation of a single path.
    ///
    /// `caller_reference` must be unique per request.
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        path: &str,
        caller_reference: &str,
    ) -> CdnResult<()>;
}

struct Distribution {
    id: String,
    provider: Arc<dyn CdnProvider>,
}

/// Resolved CDN state, fixed for the life of the process.
pub struct CdnBinding {
    distribution: Option<Distribution>,
    base_url: Url,
    sequence: AtomicU64,
}

impl CdnBinding {
    /// Look up the distribution's domain and bind to it.
    pub async fn resolve(
        provider: Arc<dyn CdnProvider>,
        distribution_id: impl Into<String>,
    ) -> CdnResult<Self> {
        let id = distribution_id.into();
        let domain = provider.distribution_domain(&id).await?;
        let base_url = parse_base_url(&format!("https://{}", domain))?;

        info!(
            distribution = %id,
            base_url = %base_url,
            "Using CloudFront distribution, URL cached in memory"
        );

        Ok(Self {
            distribution: Some(Distribution { id, provider }),
            base_url,
            sequence: AtomicU64::new(0),
        })
    }

    /// No distribution: URLs are built from `base_url` and invalidation is skipped.
    pub fn disabled(base_url: &str) -> CdnResult<Self> {
        Ok(Self {
            distribution: None,
            base_url: parse_base_url(base_url)?,
            sequence: AtomicU64::new(0),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn distribution_id(&self) -> Option<&str> {
        self.distribution.as_ref().map(|d| d.id.as_str())
    }

    /// Public URL for `key`.
    pub fn url_for(&self, key: &str) -> String {
        self.join(key).to_string()
    }

    /// Request path for `key` as clients fetch it, percent-encoded like `url_for`.
    pub fn path_for(&self, key: &str) -> String {
        self.join(key).path().to_string()
    }

    fn join(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(key.split('/'));
        }
        url
    }

    /// Invalidate the encoded path of `key` at the CDN.
    ///
    /// Returns the caller reference used, or `None` without a distribution.
    pub async fn invalidate(&self, key: &str) -> CdnResult<Option<String>> {
        let Some(distribution) = &self.distribution else {
            return Ok(None);
        };

        let path = self.path_for(key);
        let reference = self.caller_reference(key);
        distribution
            .provider
            .create_invalidation(&distribution.id, &path, &reference)
            .await?;

        info!(distribution = %distribution.id, path = %path, reference = %reference, "CDN invalidation requested");
        Ok(Some(reference))
    }

    /// `{key}-{unix millis}-{sequence}`; the sequence keeps same-millisecond calls apart.
    fn caller_reference(&self, key: &str) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", key, Utc::now().timestamp_millis(), seq)
    }
}

/// Parse a base URL and make sure it can carry path segments.
fn parse_base_url(raw: &str) -> CdnResult<Url> {
    let url = Url::parse(raw).map_err(|_| CdnError::InvalidBaseUrl(raw.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(CdnError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}
