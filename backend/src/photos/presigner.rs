use std::time::Duration;

use futures::future::try_join_all;

use super::{
    error::{PhotoError, PhotoResult},
    types::ImageRecord,
};
use crate::object_store::ObjectStore;

/// Presigns every record concurrently, preserving their order.
///
/// # Errors
///
/// Returns `PhotoError::Presign` for the first key that fails; no partially
/// presigned batch is returned.
pub async fn presign_all(
    store: &dyn ObjectStore,
    records: Vec<ImageRecord>,
    ttl: Duration,
) -> PhotoResult<Vec<ImageRecord>> {
    try_join_all(records.into_iter().map(|record| presign(store, record, ttl))).await
}

/// Presigns a single record.
///
/// # Errors
///
/// Returns `PhotoError::Presign` if the store cannot presign the key.
pub async fn presign(
    store: &dyn ObjectStore,
    mut record: ImageRecord,
    ttl: Duration,
) -> PhotoResult<ImageRecord> {
    let url = store
        .presign_get(&record.key, ttl)
        .await
        .map_err(|source| PhotoError::Presign {
            key: record.key.clone(),
            source,
        })?;
    record.url = Some(url);
    Ok(record)
}
