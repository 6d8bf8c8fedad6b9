use futures::{stream, Stream, TryStreamExt};

use crate::object_store::{ObjectDescriptor, ObjectStore, ObjectStoreError, ObjectStoreResult};

enum PageCursor {
    Start,
    Next(String),
    Done,
}

/// Lazily lists every object under `prefix`, one page request at a time.
///
/// The stream ends after the last page and yields the first listing error
/// it hits. Each call starts over from the first page.
pub fn list_objects<'a>(
    store: &'a dyn ObjectStore,
    prefix: &'a str,
) -> impl Stream<Item = ObjectStoreResult<ObjectDescriptor>> + Send + 'a {
    stream::try_unfold(PageCursor::Start, move |cursor| async move {
        let token = match cursor {
            PageCursor::Done => return Ok::<_, ObjectStoreError>(None),
            PageCursor::Start => None,
            PageCursor::Next(token) => Some(token),
        };

        let page = store.list_objects_page(prefix, token).await?;
        let next = page.next_token.map_or(PageCursor::Done, PageCursor::Next);

        Ok(Some((page.objects, next)))
    })
    .map_ok(|objects| stream::iter(objects.into_iter().map(Ok)))
    .try_flatten()
}

/// Collects the full listing under `prefix`.
///
/// # Errors
///
/// Returns the first listing error; objects from earlier pages are discarded.
pub async fn collect_objects(
    store: &dyn ObjectStore,
    prefix: &str,
) -> ObjectStoreResult<Vec<ObjectDescriptor>> {
    list_objects(store, prefix).try_collect().await
}
