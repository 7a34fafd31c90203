use super::{CdnError, CdnProvider, CdnResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudfront::Client;
use aws_sdk_cloudfront::config::Region;
use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use tracing::error;

/// CloudFront API client.
#[derive(Clone)]
pub struct CloudFrontProvider {
    client: Client,
}

impl CloudFrontProvider {
    pub async fn new(region: String) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;

        Self {
            client: Client::new(&config),
        }
    }
}

#[async_trait]
impl CdnProvider for CloudFrontProvider {
    async fn distribution_domain(&self, distribution_id: &str) -> CdnResult<String> {
        let output = self
            .client
            .get_distribution()
            .id(distribution_id)
            .send()
            .await
            .map_err(|e| CdnError::Resolve {
                id: distribution_id.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        output
            .distribution()
            .map(|distribution| distribution.domain_name().to_string())
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| CdnError::Resolve {
                id: distribution_id.to_string(),
                message: "response carried no domain name".into(),
            })
    }

    async fn create_invalidation(
        &self,
        distribution_id: &str,
        path: &str,
        caller_reference: &str,
    ) -> CdnResult<()> {
        let invalidate_err = |message: String| CdnError::Invalidate {
            id: distribution_id.to_string(),
            path: path.to_string(),
            message,
        };

        let paths = Paths::builder()
            .quantity(1)
            .items(path)
            .build()
            .map_err(|e| invalidate_err(e.to_string()))?;
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(caller_reference)
            .build()
            .map_err(|e| invalidate_err(e.to_string()))?;

        self.client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| {
                error!(error = %DisplayErrorContext(&e), distribution = %distribution_id, path = %path, "CloudFront invalidation failed");
                invalidate_err(DisplayErrorContext(&e).to_string())
            })?;

        Ok(())
    }
}
