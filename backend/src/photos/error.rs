//! Error types for the photo pipeline

use thiserror::Error;

use crate::object_store::ObjectStoreError;

/// Result type for photo operations
pub type PhotoResult<T> = Result<T, PhotoError>;

/// Errors that can occur while fetching photos
#[derive(Error, Debug)]
pub enum PhotoError {
    /// Listing the user's namespace failed; no partial listing is used
    #[error("error listing objects under {prefix}: {source}")]
    Listing {
        /// Namespace prefix being listed
        prefix: String,
        /// Underlying store error
        source: ObjectStoreError,
    },

    /// The namespace holds no image objects
    #[error("no image files found for user {user_id}")]
    NoImagesFound {
        /// Owner of the empty namespace
        user_id: String,
    },

    /// Presigning one of the selected images failed, aborting the batch
    #[error("error generating presigned URL for {key}: {source}")]
    Presign {
        /// Key that could not be presigned
        key: String,
        /// Underlying store error
        source: ObjectStoreError,
    },

    /// Downloading an object failed
    #[error("error downloading {key}: {source}")]
    Download {
        /// Key being downloaded
        key: String,
        /// Underlying store error
        source: ObjectStoreError,
    },

    /// The downloaded payload is not a decodable image
    #[error("error decoding image {key}: {source}")]
    Decode {
        /// Key of the undecodable object
        key: String,
        /// Decoder error
        source: image::ImageError,
    },

    /// Re-encoding the resized image failed
    #[error("error encoding resized image {key}: {source}")]
    Encode {
        /// Key of the source object
        key: String,
        /// Encoder error
        source: image::ImageError,
    },

    /// A spawned pipeline task panicked or was aborted
    #[error("photo task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
