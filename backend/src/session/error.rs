//! Session token error types

use thiserror::Error;

/// Errors that can occur while issuing or verifying session tokens
#[derive(Error, Debug)]
pub enum SessionError {
    /// Key material could not be loaded
    #[error("Failed to load session key: {0}")]
    InvalidKey(String),

    /// Token encoding failed
    #[error("Failed to sign session token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Token is malformed, has a bad signature or uses another algorithm
    #[error("Invalid session token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    /// Token signature is fine but it has expired
    #[error("Session token has expired")]
    Expired,
}
