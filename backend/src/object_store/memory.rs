//! In-memory [`ObjectStore`] for tests
//!
//! Objects are kept in insertion order and served in pages of a fixed size.
//! Listing and presigning failures can be injected per page or per key.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{ObjectDescriptor, ObjectPage, ObjectStore, ObjectStoreError, ObjectStoreResult};

const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    descriptor: ObjectDescriptor,
    body: Vec<u8>,
}

#[derive(Debug, Default)]
struct Failures {
    listing_pages: HashSet<usize>,
    presign_keys: HashSet<String>,
}

/// Object store that keeps everything in memory
pub struct InMemoryObjectStore {
    bucket_name: String,
    page_size: usize,
    objects: RwLock<Vec<StoredObject>>,
    failures: RwLock<Failures>,
    list_page_calls: AtomicUsize,
    presign_calls: AtomicUsize,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("test-bucket")
    }
}

impl InMemoryObjectStore {
    /// Creates an empty store
    #[must_use]
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            page_size: DEFAULT_PAGE_SIZE,
            objects: RwLock::new(Vec::new()),
            failures: RwLock::new(Failures::default()),
            list_page_calls: AtomicUsize::new(0),
            presign_calls: AtomicUsize::new(0),
        }
    }

    /// Sets how many objects a single listing page returns
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Stores an object, replacing any previous object with the same key
    pub fn put_object(&self, key: &str, modified_at: DateTime<Utc>, body: Vec<u8>) {
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        objects.retain(|object| object.descriptor.key != key);
        objects.push(StoredObject {
            descriptor: ObjectDescriptor {
                key: key.to_string(),
                size: i64::try_from(body.len()).unwrap_or(i64::MAX),
                modified_at,
            },
            body,
        });
    }

    /// Makes the listing request for page `page_index` (zero based) fail
    pub fn fail_listing_on_page(&self, page_index: usize) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .listing_pages
            .insert(page_index);
    }

    /// Makes presigning fail for `key`
    pub fn fail_presign_for(&self, key: &str) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .presign_keys
            .insert(key.to_string());
    }

    /// Number of listing page requests served so far
    #[must_use]
    pub fn list_page_calls(&self) -> usize {
        self.list_page_calls.load(Ordering::SeqCst)
    }

    /// Number of presign requests served so far
    #[must_use]
    pub fn presign_calls(&self) -> usize {
        self.presign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list_objects_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> ObjectStoreResult<ObjectPage> {
        self.list_page_calls.fetch_add(1, Ordering::SeqCst);

        let start = continuation_token
            .as_deref()
            .map(str::parse::<usize>)
            .transpose()
            .map_err(|e| ObjectStoreError::S3Error(format!("Invalid continuation token: {e}")))?
            .unwrap_or(0);
        let page_index = start / self.page_size;

        if self
            .failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .listing_pages
            .contains(&page_index)
        {
            return Err(ObjectStoreError::UpstreamError(format!(
                "listing page {page_index} of {prefix} failed"
            )));
        }

        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let matching: Vec<&StoredObject> = objects
            .iter()
            .filter(|object| object.descriptor.key.starts_with(prefix))
            .collect();

        let end = (start + self.page_size).min(matching.len());
        let page = matching
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|object| object.descriptor.clone())
            .collect();

        Ok(ObjectPage {
            objects: page,
            next_token: (end < matching.len()).then(|| end.to_string()),
        })
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> ObjectStoreResult<String> {
        let call = self.presign_calls.fetch_add(1, Ordering::SeqCst);

        if self
            .failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .presign_keys
            .contains(key)
        {
            return Err(ObjectStoreError::S3Error(format!(
                "Failed to presign {key}: signing failed"
            )));
        }

        Ok(format!(
            "memory://{}/{key}?X-Amz-Expires={}&X-Amz-Signature={call}",
            self.bucket_name,
            expires_in.as_secs()
        ))
    }

    async fn get_object(&self, key: &str) -> ObjectStoreResult<Vec<u8>> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|object| object.descriptor.key == key)
            .map(|object| object.body.clone())
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }
}
