//! In-memory [`UserRepository`] for tests

use std::collections::HashMap;

use async_trait::async_trait;
use gallery_storage::user::UserInsertRequest;
use tokio::sync::RwLock;

use super::{NewUser, User, UserRepository, UserRepositoryError};

/// User repository keyed by email
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    /// Creates an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a user, returning whether it existed
    pub async fn remove_by_email(&self, email: &str) -> bool {
        self.users.write().await.remove(email).is_some()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, UserRepositoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(UserRepositoryError::EmailTaken(user.email));
        }

        let user = User::from(UserInsertRequest::from(user));
        users.insert(user.email.clone(), user.clone());
        drop(users);
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.id == id)
            .cloned())
    }
}
