//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{
    object_store::ObjectStoreError, photos::PhotoError, session::SessionError,
    users::{PasswordError, UserRepositoryError},
};

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(
        status: StatusCode,
        code: &'static str,
        msg: impl Into<String>,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody {
                    code,
                    message: msg.into(),
                },
            },
        }
    }

    /// 400 for a request the handler rejects before doing any work
    #[must_use]
    pub fn bad_request(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, msg, false)
    }

    /// 401 for a missing or rejected credential
    #[must_use]
    pub fn unauthorized(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, msg, false)
    }

    /// 500 that hides the cause from the client
    #[must_use]
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
            true,
        )
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Photo errors are all 500s carrying their display text
impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        let (code, retry) = match &err {
            PhotoError::NoImagesFound { .. } => ("no_images_found", false),
            PhotoError::Listing {
                source: ObjectStoreError::UpstreamError(_),
                ..
            } => ("upstream_error", true),
            PhotoError::Listing { .. } => ("listing_failed", false),
            PhotoError::Presign { .. } => ("presign_failed", false),
            PhotoError::Download { .. } => ("download_failed", false),
            PhotoError::Decode { .. } | PhotoError::Encode { .. } => {
                ("image_processing_failed", false)
            }
            PhotoError::TaskFailed(_) => ("internal_error", true),
        };

        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, err.to_string(), retry)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Expired | SessionError::InvalidToken(_) => {
                tracing::debug!("Rejected session token: {err}");
                Self::unauthorized("invalid_token", "Invalid or expired token")
            }
            SessionError::InvalidKey(_) | SessionError::Signing(_) => {
                tracing::error!("Session signing error: {err}");
                Self::internal()
            }
        }
    }
}

impl From<UserRepositoryError> for AppError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::EmailTaken(_) => Self::new(
                StatusCode::CONFLICT,
                "email_taken",
                "A user with this email already exists",
                false,
            ),
            UserRepositoryError::Storage(msg) => {
                tracing::error!("User storage error: {msg}");
                Self::internal()
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        tracing::error!("Password hashing error: {err}");
        Self::internal()
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
