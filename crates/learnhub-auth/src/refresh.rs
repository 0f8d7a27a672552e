//! Refresh credential rotation.
//!
//! A valid refresh credential whose session still exists is exchanged for a
//! new access/refresh pair, and the session is rewritten so its TTL restarts.
//!
//! Under [`RotationPolicy::Permissive`] nothing is revoked: the previous
//! refresh credential and any unexpired access credential stay valid, and two
//! concurrent refreshes for one subject both succeed. Under
//! [`RotationPolicy::Strict`] the presented credential must carry the
//! session's current generation, and the rewrite bumps it.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RotationPolicy;
use crate::error::AuthError;
use crate::session::{SessionRecord, SessionStore};
use crate::token::{CredentialKind, CredentialPair, TokenIssuer};

/// Result of a successful refresh.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub credentials: CredentialPair,
    pub record: SessionRecord,
}

/// Exchanges refresh credentials for new credential pairs.
#[derive(Clone)]
pub struct RefreshCoordinator {
    issuer: Arc<TokenIssuer>,
    sessions: SessionStore,
    rotation: RotationPolicy,
    session_ttl: Duration,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(
        issuer: Arc<TokenIssuer>,
        sessions: SessionStore,
        rotation: RotationPolicy,
        session_ttl: Duration,
    ) -> Self {
        Self {
            issuer,
            sessions,
            rotation,
            session_ttl,
        }
    }

    /// Rotates `refresh_token` into a new credential pair.
    ///
    /// Any failure aborts the whole exchange; no credential is returned and
    /// the session is not rewritten.
    ///
    /// # Errors
    ///
    /// - `InvalidRefreshCredential` if the credential fails verification, or
    ///   under strict rotation belongs to an older generation
    /// - `SessionExpired` if the subject has no session
    /// - `Signing` if new credentials cannot be signed
    /// - `Storage` if the session store is unreachable
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutcome, AuthError> {
        let result = self.rotate(refresh_token).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.code(),
        };
        metrics::counter!("token_refresh_total", "outcome" => outcome).increment(1);
        result
    }

    async fn rotate(&self, refresh_token: &str) -> Result<RefreshOutcome, AuthError> {
        let claims = self
            .issuer
            .decode(refresh_token, CredentialKind::Refresh)
            .map_err(|e| {
                tracing::debug!(error = %e, "Refresh credential rejected");
                AuthError::invalid_refresh(e.to_string())
            })?;

        let Some(current) = self.sessions.get(&claims.sub).await? else {
            tracing::debug!(subject = %claims.sub, "Refresh for subject without session");
            return Err(AuthError::SessionExpired);
        };

        if self.rotation == RotationPolicy::Strict && claims.generation != current.generation {
            tracing::warn!(
                subject = %claims.sub,
                credential_generation = claims.generation,
                session_generation = current.generation,
                "Superseded refresh credential presented"
            );
            return Err(AuthError::invalid_refresh("refresh credential was superseded"));
        }

        let generation = current.generation.saturating_add(1);
        let credentials = self
            .issuer
            .issue_pair(&claims.sub, generation)
            .map_err(|e| AuthError::signing(e.to_string()))?;

        let record = SessionRecord::new(claims.sub.clone(), generation, current.snapshot);
        self.sessions.put(&record, self.session_ttl).await?;

        tracing::info!(subject = %claims.sub, generation, "Credentials refreshed");
        Ok(RefreshOutcome {
            credentials,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::IdentitySnapshot;
    use crate::{AuthConfig, ManualClock};
    use learnhub_kv::MemoryKv;

    struct Fixture {
        coordinator: RefreshCoordinator,
        issuer: Arc<TokenIssuer>,
        sessions: SessionStore,
        clock: Arc<ManualClock>,
    }

    fn fixture(rotation: RotationPolicy) -> Fixture {
        let config = AuthConfig {
            access_token_secret: "a".to_string(),
            refresh_token_secret: "r".to_string(),
            ..AuthConfig::default()
        };
        let clock = Arc::new(ManualClock::starting_now());
        let issuer = Arc::new(TokenIssuer::new(&config, clock.clone()));
        let sessions = SessionStore::new(Arc::new(MemoryKv::new()));
        Fixture {
            coordinator: RefreshCoordinator::new(
                issuer.clone(),
                sessions.clone(),
                rotation,
                config.session_ttl,
            ),
            issuer,
            sessions,
            clock,
        }
    }

    async fn seed(f: &Fixture, generation: u64) -> String {
        let record = SessionRecord::new(
            "u1",
            generation,
            IdentitySnapshot {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                role: "user".to_string(),
                avatar: None,
                course_ids: vec![],
            },
        );
        f.sessions
            .put(&record, Duration::from_secs(3600))
            .await
            .unwrap();
        f.issuer
            .issue_with_generation("u1", CredentialKind::Refresh, generation)
            .unwrap()
            .into_token()
    }

    #[tokio::test]
    async fn test_refresh_issues_new_pair_and_rewrites_session() {
        let f = fixture(RotationPolicy::Permissive);
        let token = seed(&f, 1).await;

        let outcome = f.coordinator.refresh(&token).await.unwrap();
        assert_eq!(outcome.credentials.access.claims().sub, "u1");
        assert_eq!(outcome.record.generation, 2);

        let stored = f.sessions.get("u1").await.unwrap().unwrap();
        assert_eq!(stored.generation, 2);
        assert_eq!(stored.snapshot.name, "Ada");
    }

    #[tokio::test]
    async fn test_access_credential_is_not_a_refresh_credential() {
        let f = fixture(RotationPolicy::Permissive);
        seed(&f, 1).await;
        let access = f
            .issuer
            .issue("u1", CredentialKind::Access)
            .unwrap()
            .into_token();

        assert!(matches!(
            f.coordinator.refresh(&access).await,
            Err(AuthError::InvalidRefreshCredential { .. })
        ));
    }

    #[tokio::test]
    async fn test_expired_refresh_credential_rejected() {
        let f = fixture(RotationPolicy::Permissive);
        let token = seed(&f, 1).await;
        f.clock.advance(time::Duration::days(3));

        assert!(matches!(
            f.coordinator.refresh(&token).await,
            Err(AuthError::InvalidRefreshCredential { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_session_is_session_expired() {
        let f = fixture(RotationPolicy::Permissive);
        let token = seed(&f, 1).await;
        f.sessions.delete("u1").await.unwrap();

        assert!(matches!(
            f.coordinator.refresh(&token).await,
            Err(AuthError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn test_permissive_old_refresh_still_works() {
        let f = fixture(RotationPolicy::Permissive);
        let old = seed(&f, 1).await;

        let first = f.coordinator.refresh(&old).await.unwrap();
        let again = f.coordinator.refresh(&old).await.unwrap();
        let newer = f
            .coordinator
            .refresh(first.credentials.refresh.token())
            .await
            .unwrap();

        assert_eq!(again.record.subject_id, "u1");
        assert_eq!(newer.record.subject_id, "u1");
    }

    #[tokio::test]
    async fn test_strict_rejects_superseded_refresh() {
        let f = fixture(RotationPolicy::Strict);
        let old = seed(&f, 1).await;

        let first = f.coordinator.refresh(&old).await.unwrap();
        assert!(matches!(
            f.coordinator.refresh(&old).await,
            Err(AuthError::InvalidRefreshCredential { .. })
        ));
        assert!(
            f.coordinator
                .refresh(first.credentials.refresh.token())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_signing_failure_leaves_session_untouched() {
        let f = fixture(RotationPolicy::Permissive);
        let token = seed(&f, 1).await;

        // Same refresh secret, no access secret: verification passes, issuing fails.
        let broken = Arc::new(TokenIssuer::new(
            &AuthConfig {
                refresh_token_secret: "r".to_string(),
                ..AuthConfig::default()
            },
            f.clock.clone(),
        ));
        let coordinator = RefreshCoordinator::new(
            broken,
            f.sessions.clone(),
            RotationPolicy::Permissive,
            Duration::from_secs(3600),
        );

        assert!(matches!(
            coordinator.refresh(&token).await,
            Err(AuthError::Signing { .. })
        ));
        assert_eq!(f.sessions.get("u1").await.unwrap().unwrap().generation, 1);
    }
}
