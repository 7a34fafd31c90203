use super::{ObjectStore, StorageError, StorageResult};
use crate::models::stored_object::{ObjectPage, StoredObject};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::{ByteStream, DateTime as AwsDateTime};
use aws_sdk_s3::{Client, config::Region};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, error};

/// S3 (or S3-compatible) bucket gateway.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client for `bucket` in `region`.
    ///
    /// `endpoint_url` targets an S3-compatible provider (MinIO, Spaces, ...)
    /// and switches to path-style addressing.
    pub async fn new(bucket: String, region: String, endpoint_url: Option<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;

        let client = match endpoint_url {
            Some(endpoint) => {
                let s3_config = aws_sdk_s3::config::Builder::from(&config)
                    .endpoint_url(endpoint)
                    .force_path_style(true)
                    .build();
                Client::from_conf(s3_config)
            }
            None => Client::new(&config),
        };

        Self::from_client(client, bucket)
    }

    pub fn from_client(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

fn to_chrono(value: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<StoredObject> {
        let size = bytes.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                error!(error = %DisplayErrorContext(&e), bucket = %self.bucket, key = %key, "S3 put failed");
                StorageError::Put {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        debug!(bucket = %self.bucket, key = %key, size, "S3 put successful");

        Ok(StoredObject {
            key: key.to_string(),
            size,
            content_type: content_type.map(str::to_string),
            last_modified: None,
        })
    }

    async fn list_page(&self, continuation_token: Option<String>) -> StorageResult<ObjectPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| StorageError::List(DisplayErrorContext(&e).to_string()))?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|content| {
                let key = content.key()?;
                Some(StoredObject {
                    key: key.to_string(),
                    size: content.size().unwrap_or(0).max(0) as u64,
                    content_type: None,
                    last_modified: content.last_modified().and_then(to_chrono),
                })
            })
            .collect();

        Ok(ObjectPage {
            objects,
            next_continuation_token: output.next_continuation_token().map(str::to_string),
            is_truncated: output.is_truncated().unwrap_or(false),
        })
    }

    async fn head(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    HeadObjectError::NotFound(_) => Ok(false),
                    _ => Err(StorageError::Head {
                        key: key.to_string(),
                        message: DisplayErrorContext(&e).to_string(),
                    }),
                },
                _ => Err(StorageError::Head {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }),
            },
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(bucket = %self.bucket, key = %key, "S3 delete successful");
        Ok(())
    }
}
