//! In-memory collection backend.

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::traits::{Document, DocumentStore, Predicate};
use crate::{StorageError, StorageResult};

/// In-memory collection keyed by document id.
///
/// Insertion order is preserved so `find` returns documents in the order they
/// were created, which keeps listing output stable across calls.
#[derive(Debug)]
pub struct MemoryCollection<D: Document> {
    documents: RwLock<IndexMap<String, D>>,
}

impl<D: Document> MemoryCollection<D> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(IndexMap::new()),
        }
    }

    /// Returns the number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns `true` if the collection holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl<D: Document> Default for MemoryCollection<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: Document> DocumentStore<D> for MemoryCollection<D> {
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<D>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn find(&self, predicate: Predicate<'_, D>) -> StorageResult<Vec<D>> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .filter(|doc| predicate(doc))
            .cloned()
            .collect())
    }

    async fn create(&self, document: D) -> StorageResult<D> {
        let mut documents = self.documents.write().await;
        let id = document.id().to_string();
        if documents.contains_key(&id) {
            return Err(StorageError::already_exists(D::COLLECTION, id));
        }
        documents.insert(id.clone(), document.clone());
        tracing::debug!(collection = D::COLLECTION, id = %id, "document created");
        Ok(document)
    }

    async fn update_by_id(&self, id: &str, document: D) -> StorageResult<D> {
        if document.id() != id {
            return Err(StorageError::invalid_document(format!(
                "document id '{}' does not match target id '{}'",
                document.id(),
                id
            )));
        }

        let mut documents = self.documents.write().await;
        match documents.get_mut(id) {
            Some(slot) => {
                *slot = document.clone();
                tracing::debug!(collection = D::COLLECTION, id = %id, "document updated");
                Ok(document)
            }
            None => Err(StorageError::not_found(D::COLLECTION, id)),
        }
    }

    async fn delete_by_id(&self, id: &str) -> StorageResult<D> {
        let mut documents = self.documents.write().await;
        // shift_remove keeps the remaining documents in insertion order
        let removed = documents
            .shift_remove(id)
            .ok_or_else(|| StorageError::not_found(D::COLLECTION, id))?;
        tracing::debug!(collection = D::COLLECTION, id = %id, "document deleted");
        Ok(removed)
    }
}
