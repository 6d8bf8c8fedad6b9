use std::sync::Arc;

use axum::{http::StatusCode, Extension, Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    middleware::AuthenticatedUser,
    types::AppError,
    users::{User, UserRepository},
};

/// Public profile of a user; never carries the password hash
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Returns the profile of the signed in user
///
/// # Errors
///
/// - `401 UNAUTHORIZED` - Invalid or missing authentication
/// - `404 NOT_FOUND` - The session user no longer exists
#[instrument(skip(users))]
pub async fn get_current_user(
    user: AuthenticatedUser,
    Extension(users): Extension<Arc<dyn UserRepository>>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = users
        .get_user_by_id(&user.user_id)
        .await?
        .ok_or_else(|| {
            AppError::new(
                StatusCode::NOT_FOUND,
                "user_not_found",
                "User not found",
                false,
            )
        })?;

    Ok(Json(profile.into()))
}
