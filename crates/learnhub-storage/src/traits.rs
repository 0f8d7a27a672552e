//! Document store traits.

use async_trait::async_trait;

use crate::StorageResult;

/// A filter applied to documents by [`DocumentStore::find`].
pub type Predicate<'a, D> = &'a (dyn Fn(&D) -> bool + Send + Sync);

/// A document that can be held in a collection.
///
/// Documents are plain values identified by a string id. The collection name
/// is used in error messages and log fields.
pub trait Document: Clone + Send + Sync + 'static {
    /// Name of the collection holding documents of this type.
    const COLLECTION: &'static str;

    /// Returns the document id.
    fn id(&self) -> &str;
}

/// Primary store contract for a single collection.
///
/// Every operation is a single atomic step at the store level. Nothing here
/// is transactional with any other store; callers that keep derived state
/// (caches, sessions) must reconcile it themselves after a write commits.
#[async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    /// Finds a document by id.
    ///
    /// Returns `Ok(None)` when no document has that id.
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<D>>;

    /// Returns every document matching `predicate`, in insertion order.
    async fn find(&self, predicate: Predicate<'_, D>) -> StorageResult<Vec<D>>;

    /// Inserts a new document.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if a document with the same id is present.
    async fn create(&self, document: D) -> StorageResult<D>;

    /// Replaces the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no document has that id.
    async fn update_by_id(&self, id: &str, document: D) -> StorageResult<D>;

    /// Removes the document stored under `id` and returns it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no document has that id.
    async fn delete_by_id(&self, id: &str) -> StorageResult<D>;

    /// Returns every document in the collection.
    async fn find_all(&self) -> StorageResult<Vec<D>> {
        self.find(&|_: &D| true).await
    }

    /// Returns the first document matching `predicate`.
    async fn find_one(&self, predicate: Predicate<'_, D>) -> StorageResult<Option<D>> {
        Ok(self.find(predicate).await?.into_iter().next())
    }
}
