//! Recent-photo retrieval for users
//!
//! [`PhotoService`] answers "last N photos" and "last photo" queries by
//! listing the user's namespace, keeping images, sorting newest first,
//! truncating, presigning and caching the result. It also serves raw and
//! resized downloads of single objects.

pub mod cache;
pub mod classifier;
mod error;
pub mod lister;
pub mod presigner;
pub mod resize;
pub mod resolver;
mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

pub use cache::{CacheKey, CachedPhotos, ResultCache};
pub use error::{PhotoError, PhotoResult};
pub use types::{ImageRecord, UserNamespace};

use crate::object_store::ObjectStore;

/// Photo fetch service shared by the HTTP handlers
#[derive(Clone)]
pub struct PhotoService {
    store: Arc<dyn ObjectStore>,
    cache: Arc<ResultCache>,
    presign_ttl: Duration,
}

impl PhotoService {
    /// Creates a new photo service
    ///
    /// # Arguments
    ///
    /// * `store` - Object store holding the user namespaces
    /// * `cache` - Result cache; its TTL must be shorter than `presign_ttl`
    /// * `presign_ttl` - Lifetime of the presigned URLs handed out
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, cache: Arc<ResultCache>, presign_ttl: Duration) -> Self {
        Self {
            store,
            cache,
            presign_ttl,
        }
    }

    /// Returns the `count` most recent photos of `user_id`, newest first, with
    /// presigned URLs. A `count` of zero or less returns every photo.
    ///
    /// # Errors
    ///
    /// - `PhotoError::Listing` - listing the namespace failed
    /// - `PhotoError::NoImagesFound` - the user has no photos
    /// - `PhotoError::Presign` - any selected photo could not be presigned
    #[instrument(skip(self))]
    pub async fn get_last_photos_for_user(
        &self,
        user_id: &str,
        count: i64,
    ) -> PhotoResult<Vec<ImageRecord>> {
        let cache_key = CacheKey::LastPhotos {
            user_id: user_id.to_string(),
            count,
        };

        if let Some(CachedPhotos::Many(records)) = self.cache.get(&cache_key).await {
            debug!("Photo cache hit");
            return Ok(records);
        }

        run_detached(
            self.clone()
                .fetch_last_photos(UserNamespace::new(user_id), count, cache_key),
        )
        .await
    }

    /// Returns the most recent photo of `user_id` with a presigned URL.
    ///
    /// # Errors
    ///
    /// - `PhotoError::Listing` - listing the namespace failed
    /// - `PhotoError::NoImagesFound` - the user has no photos
    /// - `PhotoError::Presign` - the photo could not be presigned
    #[instrument(skip(self))]
    pub async fn get_last_photo_for_user(&self, user_id: &str) -> PhotoResult<ImageRecord> {
        let cache_key = CacheKey::LastPhoto {
            user_id: user_id.to_string(),
        };

        if let Some(CachedPhotos::One(record)) = self.cache.get(&cache_key).await {
            debug!("Photo cache hit");
            return Ok(record);
        }

        run_detached(
            self.clone()
                .fetch_last_photo(UserNamespace::new(user_id), cache_key),
        )
        .await
    }

    /// Downloads the original bytes of `key`
    ///
    /// # Errors
    ///
    /// Returns `PhotoError::Download` if the object cannot be fetched
    #[instrument(skip(self))]
    pub async fn download_photo(&self, key: &str) -> PhotoResult<Vec<u8>> {
        self.store
            .get_object(key)
            .await
            .map_err(|source| PhotoError::Download {
                key: key.to_string(),
                source,
            })
    }

    /// Downloads `key` and returns an 800x600 PNG rendition of it
    ///
    /// # Errors
    ///
    /// - `PhotoError::Download` - the object cannot be fetched
    /// - `PhotoError::Decode` - the object is not a decodable image
    /// - `PhotoError::Encode` - the resized image could not be encoded
    #[instrument(skip(self))]
    pub async fn download_small_photo(&self, key: &str) -> PhotoResult<Vec<u8>> {
        let original = self.download_photo(key).await?;
        let key = key.to_string();

        tokio::task::spawn_blocking(move || resize::resize_to_small_png(&key, &original)).await?
    }

    async fn fetch_last_photos(
        self,
        namespace: UserNamespace,
        count: i64,
        cache_key: CacheKey,
    ) -> PhotoResult<Vec<ImageRecord>> {
        let selected = resolver::resolve(self.store.as_ref(), &namespace, count).await?;
        let records = presigner::presign_all(self.store.as_ref(), selected, self.presign_ttl).await?;

        self.cache
            .set(cache_key, CachedPhotos::Many(records.clone()))
            .await;
        info!(
            user_id = namespace.user_id(),
            count = records.len(),
            "Fetched recent photos"
        );

        Ok(records)
    }

    async fn fetch_last_photo(
        self,
        namespace: UserNamespace,
        cache_key: CacheKey,
    ) -> PhotoResult<ImageRecord> {
        let newest = resolver::resolve(self.store.as_ref(), &namespace, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PhotoError::NoImagesFound {
                user_id: namespace.user_id().to_string(),
            })?;
        let record = presigner::presign(self.store.as_ref(), newest, self.presign_ttl).await?;

        self.cache
            .set(cache_key, CachedPhotos::One(record.clone()))
            .await;
        info!(user_id = namespace.user_id(), key = %record.key, "Fetched last photo");

        Ok(record)
    }
}

/// Runs a fetch pipeline on its own task so it finishes, and fills the
/// cache, even when the request that started it goes away.
async fn run_detached<T, F>(pipeline: F) -> PhotoResult<T>
where
    T: Send + 'static,
    F: Future<Output = PhotoResult<T>> + Send + 'static,
{
    tokio::spawn(pipeline).await?
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::object_store::InMemoryObjectStore;

    const CACHE_TTL: Duration = Duration::from_secs(300);
    const PRESIGN_TTL: Duration = Duration::from_secs(3600);

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn service_with(store: &Arc<InMemoryObjectStore>) -> PhotoService {
        PhotoService::new(
            store.clone(),
            Arc::new(ResultCache::new(CACHE_TTL)),
            PRESIGN_TTL,
        )
    }

    fn store() -> Arc<InMemoryObjectStore> {
        let store = Arc::new(InMemoryObjectStore::default());
        store.put_object("user_u1/a.txt", at(30), b"notes".to_vec());
        store.put_object("user_u1/b.png", at(20), resize::tests::png_bytes(4, 4));
        store.put_object("user_u1/c.jpg", at(10), vec![1, 2, 3]);
        store.put_object("user_u2/d.png", at(40), vec![]);
        store
    }

    #[tokio::test]
    async fn test_last_photos_sorted_and_presigned() {
        let store = store();
        let service = service_with(&store);

        let photos = service.get_last_photos_for_user("u1", 2).await.unwrap();

        let keys: Vec<&str> = photos.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["user_u1/b.png", "user_u1/c.jpg"]);
        assert!(photos.iter().all(|p| p.url.is_some()));
    }

    #[tokio::test]
    async fn test_fewer_photos_than_requested() {
        let store = Arc::new(InMemoryObjectStore::default());
        store.put_object("user_u1/only.webp", at(0), vec![]);
        let service = service_with(&store);

        let photos = service.get_last_photos_for_user("u1", 3).await.unwrap();

        assert_eq!(photos.len(), 1);
    }

    #[tokio::test]
    async fn test_last_photo_for_unknown_user_is_not_found() {
        let store = store();
        let service = service_with(&store);

        let result = service.get_last_photo_for_user("nouser").await;

        assert!(matches!(result, Err(PhotoError::NoImagesFound { .. })));
    }

    #[tokio::test]
    async fn test_last_photo_is_cached_until_expiry() {
        let store = store();
        let short_ttl = Duration::from_millis(200);
        let service = PhotoService::new(
            store.clone(),
            Arc::new(ResultCache::new(short_ttl)),
            PRESIGN_TTL,
        );

        let first = service.get_last_photo_for_user("u1").await.unwrap();
        let second = service.get_last_photo_for_user("u1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.key, "user_u1/b.png");
        assert_eq!(store.list_page_calls(), 1);
        assert_eq!(store.presign_calls(), 1);

        tokio::time::sleep(short_ttl * 2).await;

        let third = service.get_last_photo_for_user("u1").await.unwrap();
        assert_eq!(third.key, first.key);
        assert_ne!(third.url, first.url);
        assert_eq!(store.list_page_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_each_fetch_then_share_cache() {
        fn keys(photos: &[ImageRecord]) -> Vec<String> {
            photos.iter().map(|p| p.key.clone()).collect()
        }

        let store = store();
        let service = service_with(&store);

        let (first, second) = tokio::join!(
            service.get_last_photos_for_user("u1", 2),
            service.get_last_photos_for_user("u1", 2),
        );

        let first = first.unwrap();
        let second = second.unwrap();
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(store.list_page_calls(), 2);
        assert_eq!(store.presign_calls(), 4);

        let third = service.get_last_photos_for_user("u1", 2).await.unwrap();

        assert_eq!(keys(&third), keys(&first));
        assert_eq!(store.list_page_calls(), 2);
        assert_eq!(store.presign_calls(), 4);
    }

    #[tokio::test]
    async fn test_last_photo_and_last_photos_use_separate_keys() {
        let store = store();
        let service = service_with(&store);

        service.get_last_photo_for_user("u1").await.unwrap();
        service.get_last_photos_for_user("u1", 1).await.unwrap();
        service.get_last_photos_for_user("u1", 2).await.unwrap();
        service.get_last_photos_for_user("u1", 2).await.unwrap();

        assert_eq!(store.list_page_calls(), 3);
    }

    #[tokio::test]
    async fn test_presign_failure_fails_whole_request_and_caches_nothing() {
        let store = Arc::new(InMemoryObjectStore::default());
        for (i, name) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            let offset = i64::try_from(i).unwrap();
            store.put_object(&format!("user_u1/{name}.png"), at(offset), vec![]);
        }
        store.fail_presign_for("user_u1/c.png");
        let cache = Arc::new(ResultCache::new(CACHE_TTL));
        let service = PhotoService::new(store.clone(), cache.clone(), PRESIGN_TTL);

        let result = service.get_last_photos_for_user("u1", 5).await;

        assert!(matches!(result, Err(PhotoError::Presign { .. })));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_listing_failure_is_not_cached() {
        let store = Arc::new(InMemoryObjectStore::default());
        store.put_object("user_u1/a.png", at(0), vec![]);
        store.fail_listing_on_page(0);
        let service = service_with(&store);

        let first = service.get_last_photos_for_user("u1", 1).await;
        let second = service.get_last_photos_for_user("u1", 1).await;

        assert!(matches!(first, Err(PhotoError::Listing { .. })));
        assert!(matches!(second, Err(PhotoError::Listing { .. })));
        assert_eq!(store.list_page_calls(), 2);
    }

    #[tokio::test]
    async fn test_download_and_resize() {
        let store = store();
        let service = service_with(&store);

        let original = service.download_photo("user_u1/a.txt").await.unwrap();
        assert_eq!(original, b"notes".to_vec());

        let small = service.download_small_photo("user_u1/b.png").await.unwrap();
        let decoded = image::load_from_memory(&small).unwrap();
        assert_eq!(decoded.width(), resize::SMALL_WIDTH);
    }

    #[tokio::test]
    async fn test_resize_of_non_image_is_decode_error() {
        let store = store();
        let service = service_with(&store);

        let result = service.download_small_photo("user_u1/c.jpg").await;

        assert!(matches!(result, Err(PhotoError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_download_missing_object() {
        let store = store();
        let service = service_with(&store);

        let result = service.download_photo("user_u1/missing.png").await;

        assert!(matches!(result, Err(PhotoError::Download { .. })));
    }

    #[tokio::test]
    async fn test_fetch_completes_after_caller_is_dropped() {
        let store = store();
        let cache = Arc::new(ResultCache::new(CACHE_TTL));
        let service = PhotoService::new(store.clone(), cache.clone(), PRESIGN_TTL);

        let request = tokio::spawn({
            let service = service.clone();
            async move { service.get_last_photo_for_user("u1").await }
        });
        while store.list_page_calls() == 0 {
            tokio::task::yield_now().await;
        }
        request.abort();

        for _ in 0..100 {
            if !cache.is_empty().await {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(cache
            .get(&CacheKey::LastPhoto {
                user_id: "u1".to_string()
            })
            .await
            .is_some());
    }
}
