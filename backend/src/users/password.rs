//! Bcrypt password hashing off the async runtime

use thiserror::Error;

/// Password hashing failed
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Bcrypt rejected the input or cost
    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    /// The blocking hashing task failed
    #[error("password task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Hashes and verifies passwords with a fixed bcrypt cost
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    /// Creates a hasher with a custom cost (4..=31)
    #[must_use]
    pub const fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Hashes `password` on a blocking task
    ///
    /// # Errors
    ///
    /// Returns `PasswordError` if bcrypt fails or the task panics
    pub async fn hash(&self, password: String) -> Result<String, PasswordError> {
        let cost = self.cost;
        Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
    }

    /// Checks `password` against a stored `hash` on a blocking task.
    /// A malformed hash never verifies.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::TaskFailed` if the task panics
    pub async fn verify(&self, password: String, hash: String) -> Result<bool, PasswordError> {
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await?
            .unwrap_or(false);
        Ok(verified)
    }
}
