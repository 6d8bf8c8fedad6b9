//! Object store boundary used by the photo core
//!
//! The photo pipeline only needs three things from storage: paginated
//! listing under a prefix, presigned GET URLs and raw object bodies.
mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
mod s3;

use std::time::Duration;

use chrono::{DateTime, Utc};

pub use error::{ObjectStoreError, ObjectStoreResult};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryObjectStore;
pub use s3::S3ObjectStore;

/// Raw metadata of one listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Object key, unique within the bucket
    pub key: String,
    /// Size in bytes
    pub size: i64,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Objects in this page, in store order
    pub objects: Vec<ObjectDescriptor>,
    /// Token for the next page, `None` when this is the last page
    pub next_token: Option<String>,
}

impl ObjectPage {
    /// Whether this page ends the listing
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

/// Storage operations the photo core depends on
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists one page of objects under `prefix`, starting at `continuation_token`
    async fn list_objects_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> ObjectStoreResult<ObjectPage>;

    /// Generates a presigned GET URL valid for `expires_in`
    async fn presign_get(&self, key: &str, expires_in: Duration) -> ObjectStoreResult<String>;

    /// Downloads the full body of an object
    async fn get_object(&self, key: &str) -> ObjectStoreResult<Vec<u8>>;
}
