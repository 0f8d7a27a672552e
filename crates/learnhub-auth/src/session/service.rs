use std::sync::Arc;
use std::time::Duration;

use super::{SessionRecord, SessionStore};
use crate::storage::User;
use crate::token::{CredentialPair, TokenIssuer};
use crate::{AuthError, AuthResult};

/// Credentials and session written by a successful login.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub credentials: CredentialPair,
    pub record: SessionRecord,
}

/// Session lifecycle on top of [`SessionStore`]: create at login, rewrite
/// after identity changes, delete at logout.
#[derive(Clone)]
pub struct SessionService {
    issuer: Arc<TokenIssuer>,
    store: SessionStore,
    session_ttl: Duration,
}

impl SessionService {
    #[must_use]
    pub fn new(issuer: Arc<TokenIssuer>, store: SessionStore, session_ttl: Duration) -> Self {
        Self {
            issuer,
            store,
            session_ttl,
        }
    }

    /// Starts a session for an authenticated user.
    ///
    /// Both credentials are minted before the session is written, so a
    /// signing failure leaves the store untouched. The generation is one past
    /// the previous session's, if any.
    ///
    /// # Errors
    ///
    /// - `AuthError::Signing` if a credential cannot be signed
    /// - `AuthError::Storage` if the session store is unreachable
    pub async fn establish(&self, user: &User) -> AuthResult<IssuedSession> {
        let generation = self
            .store
            .get(&user.id)
            .await?
            .map_or(1, |previous| previous.generation.saturating_add(1));

        let credentials = self
            .issuer
            .issue_pair(&user.id, generation)
            .map_err(|e| AuthError::signing(e.to_string()))?;

        let record = SessionRecord::new(user.id.clone(), generation, user.snapshot());
        self.store.put(&record, self.session_ttl).await?;

        tracing::info!(subject = %user.id, generation, "Session established");
        Ok(IssuedSession {
            credentials,
            record,
        })
    }

    /// Rewrites the snapshot of an existing session from `user`.
    ///
    /// Returns `false` when the user has no live session; nothing is written
    /// then. The generation is kept, so outstanding credentials stay valid.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the session store is unreachable.
    pub async fn sync(&self, user: &User) -> AuthResult<bool> {
        let Some(current) = self.store.get(&user.id).await? else {
            return Ok(false);
        };
        let updated = current.with_snapshot(user.snapshot());
        self.store.put(&updated, self.session_ttl).await?;
        tracing::debug!(subject = %user.id, "Session snapshot synced");
        Ok(true)
    }

    /// Ends the session for `subject_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the session store is unreachable.
    pub async fn end(&self, subject_id: &str) -> AuthResult<()> {
        self.store.delete(subject_id).await?;
        tracing::info!(subject = %subject_id, "Session ended");
        Ok(())
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
