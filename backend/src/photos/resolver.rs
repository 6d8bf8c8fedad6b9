use tokio::task::JoinSet;
use tracing::debug;

use super::{
    classifier::is_image,
    error::{PhotoError, PhotoResult},
    lister::collect_objects,
    types::{ImageRecord, UserNamespace},
};
use crate::object_store::{ObjectDescriptor, ObjectStore};

/// Number of listed objects classified by a single task
const CLASSIFY_CHUNK_SIZE: usize = 256;

/// Resolves the most recent images in `namespace`, newest first.
///
/// At most `limit` records are returned; a `limit` of zero or less returns
/// every image. Records with the same modification time keep their listing
/// order. The returned records are not presigned.
///
/// # Errors
///
/// - `PhotoError::Listing` if any listing page fails
/// - `PhotoError::NoImagesFound` if no listed key is an image
/// - `PhotoError::TaskFailed` if a classification task panics
pub async fn resolve(
    store: &dyn ObjectStore,
    namespace: &UserNamespace,
    limit: i64,
) -> PhotoResult<Vec<ImageRecord>> {
    let prefix = namespace.prefix();
    let objects = collect_objects(store, &prefix)
        .await
        .map_err(|source| PhotoError::Listing {
            prefix: prefix.clone(),
            source,
        })?;
    let listed = objects.len();

    let mut images = classify(objects).await?;
    images.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

    if let Some(limit) = usize::try_from(limit).ok().filter(|limit| *limit > 0) {
        images.truncate(limit);
    }

    debug!(
        user_id = namespace.user_id(),
        listed,
        selected = images.len(),
        "Resolved recent images"
    );

    if images.is_empty() {
        return Err(PhotoError::NoImagesFound {
            user_id: namespace.user_id().to_string(),
        });
    }

    Ok(images)
}

/// Keeps the image descriptors, classifying chunks of the listing in parallel.
///
/// Every task writes into its own slot so the merged output keeps the
/// listing order regardless of which task finishes first.
async fn classify(objects: Vec<ObjectDescriptor>) -> PhotoResult<Vec<ImageRecord>> {
    let mut tasks = JoinSet::new();
    let mut remaining = objects.into_iter();
    let mut chunk_count = 0;

    loop {
        let chunk: Vec<ObjectDescriptor> = remaining.by_ref().take(CLASSIFY_CHUNK_SIZE).collect();
        if chunk.is_empty() {
            break;
        }

        let slot = chunk_count;
        chunk_count += 1;
        tasks.spawn(async move {
            let images: Vec<ImageRecord> = chunk
                .into_iter()
                .filter(|object| is_image(&object.key))
                .map(ImageRecord::from)
                .collect();
            (slot, images)
        });
    }

    let mut slots: Vec<Vec<ImageRecord>> = vec![Vec::new(); chunk_count];
    while let Some(joined) = tasks.join_next().await {
        let (slot, images) = joined?;
        slots[slot] = images;
    }

    Ok(slots.into_iter().flatten().collect())
}
