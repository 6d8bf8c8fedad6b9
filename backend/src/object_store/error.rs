//! Error types for object store operations

use aws_sdk_s3::{
    error::SdkError,
    operation::{get_object::GetObjectError, list_objects_v2::ListObjectsV2Error},
};
use thiserror::Error;

/// Result type for object store operations
pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Errors that can occur during object store operations
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Object does not exist in the bucket
    #[error("Object not found: {0}")]
    NotFound(String),

    /// AWS SDK error (transport, dispatch, timeouts)
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),
}

impl From<SdkError<ListObjectsV2Error>> for ObjectStoreError {
    fn from(error: SdkError<ListObjectsV2Error>) -> Self {
        match error {
            SdkError::ServiceError(err) if err.raw().status().as_u16() >= 500 => {
                Self::UpstreamError(format!("{:?}", err.err()))
            }
            SdkError::ServiceError(err) => Self::S3Error(format!("{:?}", err.err())),
            _ => Self::AwsError(error.to_string()),
        }
    }
}

impl From<SdkError<GetObjectError>> for ObjectStoreError {
    fn from(error: SdkError<GetObjectError>) -> Self {
        match error {
            SdkError::ServiceError(err) => match err.err() {
                GetObjectError::NoSuchKey(e) => Self::NotFound(e.to_string()),
                _ if err.raw().status().as_u16() >= 500 => {
                    Self::UpstreamError(format!("{:?}", err.err()))
                }
                _ => Self::S3Error(format!("{:?}", err.err())),
            },
            _ => Self::AwsError(error.to_string()),
        }
    }
}
