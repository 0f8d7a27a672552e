use std::time::Duration;

use learnhub_kv::DynKv;

use super::{SESSION_SCHEMA_VERSION, SessionRecord};
use crate::{AuthError, AuthResult};

/// Session store adapter over the shared key-value store.
///
/// Key = subject id, value = JSON-encoded [`SessionRecord`]. Writes are
/// unconditional: concurrent `put`s for the same subject race and the last
/// one wins.
#[derive(Clone)]
pub struct SessionStore {
    kv: DynKv,
}

impl SessionStore {
    /// Creates a session store over `kv`.
    #[must_use]
    pub fn new(kv: DynKv) -> Self {
        Self { kv }
    }

    /// Writes `record` under its subject id, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store is unreachable.
    pub async fn put(&self, record: &SessionRecord, ttl: Duration) -> AuthResult<()> {
        let value = serde_json::to_vec(record)
            .map_err(|e| AuthError::internal(format!("Failed to encode session: {e}")))?;
        self.kv
            .set(&record.subject_id, value, Some(ttl))
            .await
            .map_err(AuthError::from)?;
        tracing::debug!(subject = %record.subject_id, generation = record.generation, "Session stored");
        Ok(())
    }

    /// Reads the session for `subject_id`.
    ///
    /// Returns `Ok(None)` if there is no entry, it expired, or it cannot be
    /// decoded. Undecodable entries are deleted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store is unreachable.
    pub async fn get(&self, subject_id: &str) -> AuthResult<Option<SessionRecord>> {
        let Some(bytes) = self.kv.get(subject_id).await? else {
            return Ok(None);
        };

        match decode_record(&bytes) {
            Ok(record) if record.subject_id == subject_id => Ok(Some(record)),
            Ok(record) => {
                tracing::warn!(
                    subject = %subject_id,
                    stored_subject = %record.subject_id,
                    "Session entry belongs to another subject, discarding"
                );
                self.discard(subject_id).await;
                Ok(None)
            }
            Err(reason) => {
                tracing::warn!(subject = %subject_id, error = %reason, "Undecodable session entry, discarding");
                self.discard(subject_id).await;
                Ok(None)
            }
        }
    }

    /// Deletes the session for `subject_id`. Deleting a missing session is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store is unreachable.
    pub async fn delete(&self, subject_id: &str) -> AuthResult<()> {
        let removed = self.kv.delete(subject_id).await?;
        tracing::debug!(subject = %subject_id, removed, "Session deleted");
        Ok(())
    }

    async fn discard(&self, subject_id: &str) {
        if let Err(e) = self.kv.delete(subject_id).await {
            tracing::warn!(subject = %subject_id, error = %e, "Failed to delete bad session entry");
        }
    }
}

fn decode_record(bytes: &[u8]) -> Result<SessionRecord, String> {
    let record: SessionRecord = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    if record.v != SESSION_SCHEMA_VERSION {
        return Err(format!(
            "unsupported session version {} (expected {})",
            record.v, SESSION_SCHEMA_VERSION
        ));
    }
    Ok(record)
}
