//! Short-lived memoization of presigned photo listings
//!
//! Entries expire a fixed time after they are written and are never evicted
//! for size. Reads never return an expired entry; the periodic sweep only
//! reclaims memory.

use std::sync::{Arc, Weak};
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use super::types::ImageRecord;

/// Identifies one cached photo query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Most recent `count` photos of a user
    LastPhotos {
        /// Owner of the photos
        user_id: String,
        /// Requested number of photos
        count: i64,
    },
    /// Most recent photo of a user
    LastPhoto {
        /// Owner of the photo
        user_id: String,
    },
}

/// Cached result of a photo query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedPhotos {
    /// A single record
    One(ImageRecord),
    /// Records ordered newest first
    Many(Vec<ImageRecord>),
}

/// TTL cache shared by all request tasks
#[derive(Debug)]
pub struct ResultCache {
    entries: Cache<CacheKey, CachedPhotos>,
    ttl: Duration,
}

impl ResultCache {
    /// Creates a cache whose entries live for `ttl`
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let entries = Cache::builder().time_to_live(ttl).build();

        Self { entries, ttl }
    }

    /// Creates a shared cache and starts its background sweep.
    ///
    /// The sweep stops on its own once the last `Arc` is dropped.
    #[must_use]
    pub fn with_sweeper(ttl: Duration, sweep_interval: Duration) -> Arc<Self> {
        let cache = Arc::new(Self::new(ttl));
        Self::spawn_sweeper(Arc::downgrade(&cache), sweep_interval);
        cache
    }

    fn spawn_sweeper(cache: Weak<Self>, sweep_interval: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + sweep_interval,
                sweep_interval,
            );
            loop {
                ticker.tick().await;
                let Some(strong) = cache.upgrade() else {
                    break;
                };
                strong.purge_expired().await;
                debug!(
                    remaining = strong.entries.entry_count(),
                    "Swept expired photo cache entries"
                );
            }
        });
    }

    /// Entry lifetime
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value if present and not expired
    pub async fn get(&self, key: &CacheKey) -> Option<CachedPhotos> {
        self.entries.get(key).await
    }

    /// Stores `value` under `key`, replacing any previous entry
    pub async fn set(&self, key: CacheKey, value: CachedPhotos) {
        self.entries.insert(key, value).await;
    }

    /// Drops expired entries from memory
    pub async fn purge_expired(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Number of live entries
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    /// Whether the cache holds no live entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    const TTL: Duration = Duration::from_secs(300);
    const SHORT_TTL: Duration = Duration::from_millis(200);

    fn key(user_id: &str) -> CacheKey {
        CacheKey::LastPhoto {
            user_id: user_id.to_string(),
        }
    }

    fn value(name: &str) -> CachedPhotos {
        CachedPhotos::One(ImageRecord {
            key: name.to_string(),
            size: 1,
            modified_at: DateTime::<Utc>::default(),
            url: Some(format!("https://example.com/{name}")),
        })
    }

    #[tokio::test]
    async fn test_get_before_and_after_expiry() {
        let cache = ResultCache::new(SHORT_TTL);
        cache.set(key("u1"), value("a.png")).await;

        assert_eq!(cache.get(&key("u1")).await, Some(value("a.png")));

        tokio::time::sleep(SHORT_TTL * 2).await;

        assert_eq!(cache.get(&key("u1")).await, None);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = ResultCache::new(TTL);
        cache.set(key("u1"), value("a.png")).await;

        let many = CacheKey::LastPhotos {
            user_id: "u1".to_string(),
            count: 1,
        };
        assert_eq!(cache.get(&many).await, None);
        assert_eq!(cache.get(&key("u2")).await, None);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let cache = ResultCache::new(TTL);
        cache.set(key("u1"), value("a.png")).await;
        cache.set(key("u1"), value("b.png")).await;

        assert_eq!(cache.get(&key("u1")).await, Some(value("b.png")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_expired_only_removes_stale_entries() {
        let cache = ResultCache::new(SHORT_TTL);
        cache.set(key("old"), value("a.png")).await;
        tokio::time::sleep(SHORT_TTL * 2).await;
        cache.set(key("new"), value("b.png")).await;

        cache.purge_expired().await;

        assert_eq!(cache.get(&key("new")).await, Some(value("b.png")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_writers_leave_one_entry() {
        let cache = Arc::new(ResultCache::new(TTL));

        let writers = (0..8).map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.set(key("u1"), value(&format!("{i}.png"))).await })
        });
        for writer in writers {
            writer.await.unwrap();
        }

        assert!(cache.get(&key("u1")).await.is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_sweeper_reclaims_expired_entries() {
        let cache = ResultCache::with_sweeper(SHORT_TTL, Duration::from_millis(300));
        cache.set(key("u1"), value("a.png")).await;

        tokio::time::sleep(Duration::from_millis(700)).await;

        assert_eq!(cache.entries.entry_count(), 0);
    }
}
