//! User accounts as seen by the HTTP handlers

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod password;

use async_trait::async_trait;
use gallery_storage::user::{UserInsertRequest, UserStorage, UserStorageError};
use thiserror::Error;

pub use gallery_storage::user::User;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryUserRepository;
pub use password::{PasswordError, PasswordHasher};

/// Errors surfaced by a [`UserRepository`]
#[derive(Error, Debug)]
pub enum UserRepositoryError {
    /// The email is already registered
    #[error("a user with email {0} already exists")]
    EmailTaken(String),

    /// The backing store failed
    #[error("user storage error: {0}")]
    Storage(String),
}

impl From<UserStorageError> for UserRepositoryError {
    fn from(err: UserStorageError) -> Self {
        match err {
            UserStorageError::UserExists(email) => Self::EmailTaken(email),
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Details of a user to create; the password is already hashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Login email, unique across users
    pub email: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
    /// Optional display name
    pub name: Option<String>,
}

impl From<NewUser> for UserInsertRequest {
    fn from(user: NewUser) -> Self {
        Self {
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
        }
    }
}

/// Persistent user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates a user and returns it with its generated id
    async fn create_user(&self, user: NewUser) -> Result<User, UserRepositoryError>;

    /// Looks a user up by login email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError>;

    /// Looks a user up by id
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, UserRepositoryError>;
}

#[async_trait]
impl UserRepository for UserStorage {
    async fn create_user(&self, user: NewUser) -> Result<User, UserRepositoryError> {
        Ok(self.insert(user.into()).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.get_by_email(email).await?)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.get_by_id(id).await?)
    }
}
