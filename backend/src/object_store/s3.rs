use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::{presigning::PresigningConfig, primitives::DateTime as SmithyDateTime, Client};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{ObjectDescriptor, ObjectPage, ObjectStore, ObjectStoreError, ObjectStoreResult};

/// S3 (or S3-compatible) implementation of [`ObjectStore`]
pub struct S3ObjectStore {
    s3_client: Arc<Client>,
    bucket_name: String,
}

impl S3ObjectStore {
    /// Creates a new S3 object store
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - Bucket holding the user photos
    #[must_use]
    pub const fn new(s3_client: Arc<Client>, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }
}

/// Converts an S3 `LastModified`. A missing or out of range timestamp becomes
/// the Unix epoch, so the object sorts after every dated one.
fn to_chrono(key: &str, timestamp: Option<&SmithyDateTime>) -> DateTime<Utc> {
    let converted = timestamp.and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()));
    if converted.is_none() {
        debug!(key, "Object has no usable LastModified, treating it as oldest");
    }
    converted.unwrap_or_default()
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> ObjectStoreResult<ObjectPage> {
        let output = self
            .s3_client
            .list_objects_v2()
            .bucket(&self.bucket_name)
            .prefix(prefix)
            .set_continuation_token(continuation_token)
            .send()
            .await?;

        let objects: Vec<ObjectDescriptor> = output
            .contents()
            .iter()
            .filter_map(|object| {
                object.key().map(|key| ObjectDescriptor {
                    key: key.to_string(),
                    size: object.size().unwrap_or_default(),
                    modified_at: to_chrono(key, object.last_modified()),
                })
            })
            .collect();

        let next_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(ToString::to_string)
        } else {
            None
        };

        debug!(
            prefix,
            count = objects.len(),
            has_more = next_token.is_some(),
            "Listed object page"
        );

        Ok(ObjectPage {
            objects,
            next_token,
        })
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> ObjectStoreResult<String> {
        let presigning_config = PresigningConfig::expires_in(expires_in).map_err(|e| {
            ObjectStoreError::ConfigError(format!("Failed to create presigning config: {e}"))
        })?;

        let presigned = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| ObjectStoreError::S3Error(format!("Failed to presign {key}: {e}")))?;

        Ok(presigned.uri().to_string())
    }

    async fn get_object(&self, key: &str) -> ObjectStoreResult<Vec<u8>> {
        let output = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::AwsError(format!("Failed to read body of {key}: {e}")))?;

        Ok(body.into_bytes().to_vec())
    }
}
