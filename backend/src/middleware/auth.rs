use std::sync::Arc;

use aide::OperationIo;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
    Extension,
};
use tower_cookies::Cookies;

use crate::{
    session::{SessionClaims, SessionManager, SESSION_COOKIE_NAME},
    types::AppError,
};

/// Authenticated user information extracted from the session token
#[derive(Debug, Clone, OperationIo)]
pub struct AuthenticatedUser {
    /// Id of the session owner
    pub user_id: String,
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
        }
    }
}

/// Axum extractor for authenticated user
///
/// Only available on routes behind [`auth_middleware`]:
/// ```ignore
/// async fn protected_handler(
///     user: AuthenticatedUser,
/// ) -> Result<impl IntoResponse, AppError> {
///     Ok(user.user_id)
/// }
/// ```
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            AppError::unauthorized(
                "missing_auth",
                "Authentication required but user not found in request extensions",
            )
        })
    }
}

/// Session authentication middleware
///
/// 1. Takes the Bearer token from the Authorization header, or the session cookie
/// 2. Validates it with `SessionManager`
/// 3. Adds `AuthenticatedUser` to request extensions
///
/// # Errors
///
/// - `AppError` - Invalid/missing token with 401 status code
pub async fn auth_middleware(
    Extension(session_manager): Extension<Arc<SessionManager>>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string);

    let token = bearer
        .or_else(|| {
            cookies
                .get(SESSION_COOKIE_NAME)
                .map(|cookie| cookie.value().to_string())
        })
        .ok_or_else(|| {
            AppError::unauthorized(
                "missing_token",
                "A Bearer token or session cookie is required",
            )
        })?;

    let claims = session_manager.validate(&token)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(claims));

    Ok(next.run(request).await)
}
