//! Error types for user storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    get_item::GetItemError, put_item::PutItemError, query::QueryError,
};
use thiserror::Error;

/// Result type for user storage operations
pub type UserStorageResult<T> = Result<T, UserStorageError>;

/// Errors that can occur during user storage operations
#[derive(Error, Debug)]
pub enum UserStorageError {
    /// Failed to insert user into `DynamoDB`
    #[error("Failed to insert user into DynamoDB: {0:?}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to get user from `DynamoDB`
    #[error("Failed to get user from DynamoDB: {0:?}")]
    DynamoDbGetError(#[from] SdkError<GetItemError>),

    /// Failed to query users from `DynamoDB`
    #[error("Failed to query users from DynamoDB: {0:?}")]
    DynamoDbQueryError(#[from] SdkError<QueryError>),

    /// A user with the same email already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Serialization error for `serde_dynamo`
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_dynamo::Error> for UserStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
