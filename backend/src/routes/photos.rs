use axum::{
    extract::{Path, Query},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Extension, Json,
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    photos::{ImageRecord, PhotoService},
    types::AppError,
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UserPath {
    /// Owner of the photo namespace
    pub user_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LastPhotosQuery {
    /// How many photos to return, newest first. Zero or less returns all of them.
    pub photo_num: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoPath {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    #[serde(rename = "Image-Type")]
    pub image_type: Option<String>,
}

/// Size variant of a downloaded photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// 800x600 PNG rendition
    Small,
    /// Original bytes
    Big,
}

impl ImageSize {
    /// Anything other than `small` or `image/small` is the original
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("small" | "image/small") => Self::Small,
            _ => Self::Big,
        }
    }
}

/// Returns the most recent photos of a user with presigned URLs
///
/// # Errors
///
/// - `400 BAD_REQUEST` - `photo_num` is missing or not an integer
/// - `401 UNAUTHORIZED` - Invalid or missing authentication
/// - `500 INTERNAL_SERVER_ERROR` - No photos, or listing or presigning failed
#[instrument(skip(photo_service))]
pub async fn get_last_photos(
    Extension(photo_service): Extension<PhotoService>,
    Path(UserPath { user_id }): Path<UserPath>,
    Query(query): Query<LastPhotosQuery>,
) -> Result<Json<Vec<ImageRecord>>, AppError> {
    let count = query
        .photo_num
        .as_deref()
        .and_then(|num| num.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::bad_request("invalid_photo_num", "Invalid photo_num parameter"))?;

    let photos = photo_service
        .get_last_photos_for_user(&user_id, count)
        .await?;

    Ok(Json(photos))
}

/// Returns the most recent photo of a user with a presigned URL
///
/// # Errors
///
/// - `401 UNAUTHORIZED` - Invalid or missing authentication
/// - `500 INTERNAL_SERVER_ERROR` - No photos, or listing or presigning failed
#[instrument(skip(photo_service))]
pub async fn get_last_photo(
    Extension(photo_service): Extension<PhotoService>,
    Path(UserPath { user_id }): Path<UserPath>,
) -> Result<Json<ImageRecord>, AppError> {
    let photo = photo_service.get_last_photo_for_user(&user_id).await?;

    Ok(Json(photo))
}

/// Downloads a photo by key as PNG bytes, resized when `Image-Type=small`
///
/// # Errors
///
/// - `401 UNAUTHORIZED` - Invalid or missing authentication
/// - `500 INTERNAL_SERVER_ERROR` - Missing object, or download or resize failed
#[instrument(skip(photo_service))]
pub async fn download_photo(
    Extension(photo_service): Extension<PhotoService>,
    Path(PhotoPath { key }): Path<PhotoPath>,
    Query(query): Query<PhotoQuery>,
) -> Result<Response, AppError> {
    let bytes = match ImageSize::parse(query.image_type.as_deref()) {
        ImageSize::Small => photo_service.download_small_photo(&key).await?,
        ImageSize::Big => photo_service.download_photo(&key).await?,
    };

    Ok(([(CONTENT_TYPE, "image/png")], bytes).into_response())
}
