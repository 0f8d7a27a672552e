use async_trait::async_trait;
use learnhub_storage::{DocumentStore, DynCollection, StorageError};

use super::{User, UserStorage};
use crate::{AuthError, AuthResult};

/// [`UserStorage`] backed by a document store collection.
#[derive(Clone)]
pub struct CollectionUserStorage {
    users: DynCollection<User>,
}

impl CollectionUserStorage {
    /// Wraps a user collection.
    #[must_use]
    pub fn new(users: DynCollection<User>) -> Self {
        Self { users }
    }

    /// Returns the underlying collection handle.
    #[must_use]
    pub fn collection(&self) -> &DynCollection<User> {
        &self.users
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::storage(err.to_string())
    }
}

#[async_trait]
impl UserStorage for CollectionUserStorage {
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<User>> {
        Ok(self.users.find_by_id(id).await?)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .find_one(&|user: &User| user.email == email)
            .await?)
    }

    async fn create(&self, user: User) -> AuthResult<User> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(AuthError::invalid_request("Email already exists"));
        }
        Ok(self.users.create(user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_storage::MemoryCollection;
    use std::sync::Arc;

    fn storage() -> CollectionUserStorage {
        CollectionUserStorage::new(Arc::new(MemoryCollection::new()))
    }

    #[tokio::test]
    async fn test_find_by_email_case_insensitive() {
        let storage = storage();
        let user = storage
            .create(User::new("Ada", "ada@example.com"))
            .await
            .unwrap();

        let found = storage.find_by_email("ADA@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id.clone()));
        assert!(storage.find_by_id(&user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let storage = storage();
        storage
            .create(User::new("Ada", "ada@example.com"))
            .await
            .unwrap();
        let err = storage
            .create(User::new("Other Ada", "ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
    }
}
