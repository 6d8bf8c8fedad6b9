//! Session tokens
//!
//! A [`SessionManager`] is built once at startup from [`SessionConfig`] and
//! shared as an axum `Extension`. Tokens are compact JWTs with the claims
//! `{ sub, iat, exp }`, signed either with an HMAC secret (HS256) or an RSA
//! key pair (RS256).

pub mod error;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

pub use error::SessionError;

use crate::types::SessionConfig;

/// Lifetime of an issued session token
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// Cookie carrying the session token for browser clients
pub const SESSION_COOKIE_NAME: &str = "gallery_session";

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id of the session owner
    pub sub: String,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// A freshly issued token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWT
    pub token: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl SessionManager {
    /// Builds a manager from the configured key material.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidKey` if the secret is empty or a PEM key
    /// cannot be parsed
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        let (algorithm, encoding_key, decoding_key) = match config {
            SessionConfig::Hs256 { secret } => {
                if secret.is_empty() {
                    return Err(SessionError::InvalidKey("empty HS256 secret".to_string()));
                }
                (
                    Algorithm::HS256,
                    EncodingKey::from_secret(secret.as_bytes()),
                    DecodingKey::from_secret(secret.as_bytes()),
                )
            }
            SessionConfig::Rs256 {
                private_key_pem,
                public_key_pem,
            } => (
                Algorithm::RS256,
                EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|e| {
                    SessionError::InvalidKey(format!("RS256 private key: {e}"))
                })?,
                DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
                    .map_err(|e| SessionError::InvalidKey(format!("RS256 public key: {e}")))?,
            ),
        };

        tracing::info!("Session manager initialized with {algorithm:?}");

        Ok(Self {
            algorithm,
            encoding_key,
            decoding_key,
            lifetime: Duration::hours(SESSION_LIFETIME_HOURS),
        })
    }

    /// Issues a token for `user_id` valid for [`SESSION_LIFETIME_HOURS`]
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Signing` if encoding fails
    pub fn issue_token(&self, user_id: &str) -> Result<IssuedToken, SessionError> {
        self.issue_token_at(user_id, Utc::now())
    }

    fn issue_token_at(
        &self,
        user_id: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, SessionError> {
        let expires_at = issued_at + self.lifetime;
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(SessionError::Signing)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies `token` and returns its claims
    ///
    /// # Errors
    ///
    /// - `SessionError::Expired` - the token is past its expiry
    /// - `SessionError::InvalidToken` - anything else wrong with the token
    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::InvalidToken(e),
            })
    }
}
