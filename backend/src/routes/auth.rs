use std::sync::Arc;

use aide::OperationIo;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Extension, Json,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tower_cookies::{
    cookie::{time, SameSite},
    Cookie, Cookies,
};
use tracing::{info, instrument};

use crate::{
    session::{SessionManager, SESSION_COOKIE_NAME, SESSION_LIFETIME_HOURS},
    types::AppError,
    users::{NewUser, PasswordHasher, UserRepository},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SignupRequest {
    /// Login email, unique across users
    pub email: String,
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SignupResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SigninResponse {
    pub message: String,
    /// Session token, also set as the `gallery_session` cookie
    pub access_token: String,
    /// ISO-8601 UTC timestamp when the token expires
    pub expires_at: String,
}

/// Cookie jar of the request, written back by `CookieManagerLayer`
#[derive(OperationIo)]
pub struct SessionCookies(Cookies);

impl<S> FromRequestParts<S> for SessionCookies
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Cookies::from_request_parts(parts, state)
            .await
            .map(Self)
            .map_err(|(status, msg)| AppError::new(status, "cookies_unavailable", msg, false))
    }
}

/// Registers a new user
///
/// # Returns
///
/// Returns `201 CREATED` once the user is stored
///
/// # Errors
///
/// - `400 BAD_REQUEST` - Email or password is empty
/// - `409 CONFLICT` - Email already registered
/// - `500 INTERNAL_SERVER_ERROR` - Hashing or storage failure
#[instrument(skip_all, fields(email = %payload.email))]
pub async fn signup(
    Extension(users): Extension<Arc<dyn UserRepository>>,
    Extension(hasher): Extension<PasswordHasher>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let email = payload.email.trim().to_string();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request(
            "missing_credentials",
            "Email and password are required",
        ));
    }

    let password_hash = hasher.hash(payload.password).await?;
    let user = users
        .create_user(NewUser {
            email,
            password_hash,
            name: payload.name.filter(|name| !name.trim().is_empty()),
        })
        .await?;

    info!(user_id = %user.id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

/// Signs a user in
///
/// Issues a session token, returns it in the body and sets it as an
/// HttpOnly session cookie.
///
/// # Errors
///
/// - `401 UNAUTHORIZED` - Unknown email or wrong password
/// - `500 INTERNAL_SERVER_ERROR` - Storage or signing failure
#[instrument(skip_all, fields(email = %payload.email))]
pub async fn signin(
    Extension(users): Extension<Arc<dyn UserRepository>>,
    Extension(hasher): Extension<PasswordHasher>,
    Extension(session_manager): Extension<Arc<SessionManager>>,
    SessionCookies(cookies): SessionCookies,
    Json(payload): Json<SigninRequest>,
) -> Result<Json<SigninResponse>, AppError> {
    let user = users
        .get_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid_credentials", INVALID_CREDENTIALS))?;

    if !hasher
        .verify(payload.password, user.password_hash.clone())
        .await?
    {
        return Err(AppError::unauthorized(
            "invalid_credentials",
            INVALID_CREDENTIALS,
        ));
    }

    let issued = session_manager.issue_token(&user.id)?;

    cookies.add(
        Cookie::build((SESSION_COOKIE_NAME, issued.token.clone()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::hours(SESSION_LIFETIME_HOURS))
            .build(),
    );

    info!(user_id = %user.id, "User signed in");

    Ok(Json(SigninResponse {
        message: "Successfully signed in".to_string(),
        access_token: issued.token,
        expires_at: issued.expires_at.to_rfc3339(),
    }))
}
