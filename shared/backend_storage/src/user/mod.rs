//! User storage using `DynamoDB`
//!
//! The email is the partition key, so a conditional put is enough to keep
//! emails unique. Lookups by id go through a global secondary index on `id`.

mod error;

use std::sync::Arc;

use aws_sdk_dynamodb::{error::SdkError, types::AttributeValue, Client as DynamoDbClient};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

pub use error::{UserStorageError, UserStorageResult};

/// Attribute names for the users table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum UserAttribute {
    /// Email (Primary Key)
    Email,
    /// Generated user id (GSI partition key)
    Id,
    /// Bcrypt hash of the password
    PasswordHash,
    /// Optional display name
    Name,
    /// Creation timestamp (unix seconds)
    CreatedAt,
}

/// User record as stored in the users table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Generated user id, also used as the photo namespace
    pub id: String,
    /// Email (Primary Key)
    pub email: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
    /// Optional display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Creation timestamp (unix seconds)
    pub created_at: i64,
}

/// Request to create a new user
#[derive(Debug, Clone)]
pub struct UserInsertRequest {
    /// Email of the new user
    pub email: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
    /// Optional display name
    pub name: Option<String>,
}

impl From<UserInsertRequest> for User {
    fn from(request: UserInsertRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: request.email,
            password_hash: request.password_hash,
            name: request.name,
            created_at: Utc::now().timestamp(),
        }
    }
}

/// User storage client for `DynamoDB` operations
pub struct UserStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
    id_index_name: String,
}

impl UserStorage {
    /// Creates a new user storage client
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for users
    /// * `id_index_name` - Name of the GSI keyed by user id
    #[must_use]
    pub const fn new(
        dynamodb_client: Arc<DynamoDbClient>,
        table_name: String,
        id_index_name: String,
    ) -> Self {
        Self {
            dynamodb_client,
            table_name,
            id_index_name,
        }
    }

    /// Inserts a new user, generating its id
    ///
    /// # Errors
    ///
    /// Returns `UserStorageError::UserExists` if the email is already registered
    /// Returns `UserStorageError` if the `DynamoDB` operation fails
    pub async fn insert(&self, request: UserInsertRequest) -> UserStorageResult<User> {
        let user = User::from(request);
        let item = serde_dynamo::to_item(&user)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", UserAttribute::Email.to_string())
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    UserStorageError::UserExists(user.email.clone())
                } else {
                    err.into()
                }
            })?;

        tracing::info!(user_id = %user.id, "Created user");

        Ok(user)
    }

    /// Gets a user by email
    ///
    /// # Errors
    ///
    /// Returns `UserStorageError` if the `DynamoDB` operation fails
    pub async fn get_by_email(&self, email: &str) -> UserStorageResult<Option<User>> {
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key(
                UserAttribute::Email.to_string(),
                AttributeValue::S(email.to_string()),
            )
            .send()
            .await?;

        response
            .item()
            .map(|item| serde_dynamo::from_item(item.clone()).map_err(UserStorageError::from))
            .transpose()
    }

    /// Gets a user by id through the id index
    ///
    /// # Errors
    ///
    /// Returns `UserStorageError` if the `DynamoDB` query fails
    pub async fn get_by_id(&self, id: &str) -> UserStorageResult<Option<User>> {
        let response = self
            .dynamodb_client
            .query()
            .table_name(&self.table_name)
            .index_name(&self.id_index_name)
            .key_condition_expression("#id = :id")
            .expression_attribute_names("#id", UserAttribute::Id.to_string())
            .expression_attribute_values(":id", AttributeValue::S(id.to_string()))
            .limit(1)
            .send()
            .await?;

        response
            .items()
            .first()
            .map(|item| serde_dynamo::from_item(item.clone()).map_err(UserStorageError::from))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_request_generates_id_and_timestamp() {
        let before = Utc::now().timestamp();
        let user = User::from(UserInsertRequest {
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: Some("Ada".to_string()),
        });

        assert!(Uuid::parse_str(&user.id).is_ok());
        assert_eq!(user.email, "ada@example.com");
        assert!(user.created_at >= before);
    }

    #[test]
    fn test_attribute_names_are_snake_case() {
        assert_eq!(UserAttribute::Email.to_string(), "email");
        assert_eq!(UserAttribute::PasswordHash.to_string(), "password_hash");
        assert_eq!(UserAttribute::CreatedAt.to_string(), "created_at");
    }

    #[test]
    fn test_user_item_round_trip_omits_missing_name() {
        let user = User {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            password_hash: "hash".to_string(),
            name: None,
            created_at: 1,
        };

        let item: std::collections::HashMap<String, AttributeValue> =
            serde_dynamo::to_item(&user).unwrap();
        assert!(!item.contains_key("name"));

        let back: User = serde_dynamo::from_item(item).unwrap();
        assert_eq!(back, user);
    }
}
