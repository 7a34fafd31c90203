use super::{CdnError, CdnProvider, CdnResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// One recorded `create_invalidation` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidationCall {
    pub distribution_id: String,
    pub path: String,
    pub caller_reference: String,
}

/// CDN provider that serves a fixed domain and records invalidations.
#[derive(Clone)]
pub struct MockCdnProvider {
    domain: String,
    fail_resolve: bool,
    fail_invalidation: bool,
    resolve_count: Arc<Mutex<usize>>,
    invalidations: Arc<Mutex<Vec<InvalidationCall>>>,
}

impl MockCdnProvider {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            fail_resolve: false,
            fail_invalidation: false,
            resolve_count: Arc::new(Mutex::new(0)),
            invalidations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_failing_resolve(mut self) -> Self {
        self.fail_resolve = true;
        self
    }

    pub fn with_failing_invalidation(mut self) -> Self {
        self.fail_invalidation = true;
        self
    }

    pub fn resolve_count(&self) -> usize {
        *self.resolve_count.lock().unwrap()
    }

    pub fn invalidations(&self) -> Vec<InvalidationCall> {
        self.invalidations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CdnProvider for MockCdnProvider {
    async fn distribution_domain(&self, distribution_id: &str) -> CdnResult<String> {
        *self.resolve_count.lock().unwrap() += 1;
        if self.fail_resolve {
            return Err(CdnError::Resolve {
                id: distribution_id.to_string(),
                message: "mock distribution lookup failure".into(),
            });
        }
        Ok(self.domain.clone())
    }

    async fn create_invalidation(
        &self,
        distribution_id: &str,
        path: &str,
        caller_reference: &str,
    ) -> CdnResult<()> {
        if self.fail_invalidation {
            return Err(CdnError::Invalidate {
                id: distribution_id.to_string(),
                path: path.to_string(),
                message: "mock invalidation failure".into(),
            });
        }
        self.invalidations.lock().unwrap().push(InvalidationCall {
            distribution_id: distribution_id.to_string(),
            path: path.to_string(),
            caller_reference: caller_reference.to_string(),
        });
        Ok(())
    }
}
