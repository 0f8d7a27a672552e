//! The per-request authentication state machine.
//!
//! ```text
//! NoCredential ─┐
//!               ├─> Rejected(reason)
//! CredentialPresent ──> CredentialVerified ──> SessionHydrated ──> Authorized
//! ```
//!
//! Every non-terminal state advances by exactly one [`AuthGate::step`]. Any
//! step may end in `Rejected`.

use std::sync::Arc;

use super::types::IdentityContext;
use crate::config::RotationPolicy;
use crate::error::AuthError;
use crate::session::{SessionRecord, SessionStore};
use crate::token::{CredentialClaims, CredentialKind, TokenIssuer};

/// State of one request passing through the gate.
#[derive(Debug)]
pub enum GateState {
    /// No access credential was found on the request.
    NoCredential,
    /// A credential was found but not yet verified.
    CredentialPresent(String),
    /// The credential verified; the session has not been read yet.
    CredentialVerified(CredentialClaims),
    /// The session was read for the credential's subject.
    SessionHydrated {
        claims: CredentialClaims,
        record: SessionRecord,
    },
    /// Terminal: the request carries this identity.
    Authorized(IdentityContext),
    /// Terminal: the request is refused.
    Rejected(AuthError),
}

impl GateState {
    /// Initial state for a request, given the credential it carries.
    #[must_use]
    pub fn start(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.is_empty() => Self::CredentialPresent(token),
            _ => Self::NoCredential,
        }
    }

    /// Returns `true` for `Authorized` and `Rejected`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Authorized(_) | Self::Rejected(_))
    }

    /// Short state name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoCredential => "no_credential",
            Self::CredentialPresent(_) => "credential_present",
            Self::CredentialVerified(_) => "credential_verified",
            Self::SessionHydrated { .. } => "session_hydrated",
            Self::Authorized(_) => "authorized",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// Turns an access credential into an [`IdentityContext`].
///
/// Reads the session store once per request and never the user directory.
#[derive(Clone)]
pub struct AuthGate {
    issuer: Arc<TokenIssuer>,
    sessions: SessionStore,
    rotation: RotationPolicy,
}

impl AuthGate {
    #[must_use]
    pub fn new(issuer: Arc<TokenIssuer>, sessions: SessionStore, rotation: RotationPolicy) -> Self {
        Self {
            issuer,
            sessions,
            rotation,
        }
    }

    /// Advances `state` by one transition. Terminal states are returned
    /// unchanged.
    pub async fn step(&self, state: GateState) -> GateState {
        match state {
            GateState::NoCredential => GateState::Rejected(AuthError::MissingCredential),

            GateState::CredentialPresent(token) => {
                match self.issuer.decode(&token, CredentialKind::Access) {
                    Ok(claims) => GateState::CredentialVerified(claims),
                    Err(e) => {
                        tracing::debug!(error = %e, "Access credential rejected");
                        GateState::Rejected(AuthError::invalid_credential(e.to_string()))
                    }
                }
            }

            GateState::CredentialVerified(claims) => match self.sessions.get(&claims.sub).await {
                Ok(Some(record)) => GateState::SessionHydrated { claims, record },
                Ok(None) => {
                    tracing::debug!(subject = %claims.sub, "No session for verified credential");
                    GateState::Rejected(AuthError::SessionNotFound)
                }
                Err(e) => GateState::Rejected(e),
            },

            GateState::SessionHydrated { claims, record } => {
                if self.rotation == RotationPolicy::Strict && claims.generation != record.generation
                {
                    tracing::debug!(
                        subject = %claims.sub,
                        credential_generation = claims.generation,
                        session_generation = record.generation,
                        "Access credential superseded by a newer session generation"
                    );
                    return GateState::Rejected(AuthError::invalid_credential(
                        "credential was superseded",
                    ));
                }
                GateState::Authorized(IdentityContext::from_session(claims, record))
            }

            terminal => terminal,
        }
    }

    /// Runs the state machine from `start` to a terminal state.
    pub async fn run(&self, start: GateState) -> GateState {
        let mut state = start;
        while !state.is_terminal() {
            state = self.step(state).await;
        }
        state
    }

    /// Authenticates a request carrying `token`.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if `token` is absent or empty
    /// - `InvalidOrExpiredCredential` if verification fails
    /// - `SessionNotFound` if the subject has no session
    /// - `Storage` if the session store is unreachable
    pub async fn authenticate(&self, token: Option<String>) -> Result<IdentityContext, AuthError> {
        match self.run(GateState::start(token)).await {
            GateState::Authorized(identity) => Ok(identity),
            GateState::Rejected(err) => {
                metrics::counter!("auth_rejections_total", "reason" => err.code()).increment(1);
                Err(err)
            }
            other => Err(AuthError::internal(format!(
                "auth gate stopped in non-terminal state {}",
                other.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::IdentitySnapshot;
    use crate::{AuthConfig, ManualClock};
    use learnhub_kv::MemoryKv;
    use std::time::Duration;

    struct Fixture {
        gate: AuthGate,
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
            gate: AuthGate::new(issuer.clone(), sessions.clone(), rotation),
            issuer,
            sessions,
            clock,
        }
    }

    fn record(subject: &str, generation: u64) -> SessionRecord {
        SessionRecord::new(
            subject,
            generation,
            IdentitySnapshot {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                role: "user".to_string(),
                avatar: None,
                course_ids: vec![],
            },
        )
    }

    const TTL: Duration = Duration::from_secs(600);

    #[tokio::test]
    async fn test_no_credential_rejected() {
        let f = fixture(RotationPolicy::Permissive);
        assert!(matches!(
            f.gate.authenticate(None).await,
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            f.gate.authenticate(Some(String::new())).await,
            Err(AuthError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_walks_every_state() {
        let f = fixture(RotationPolicy::Permissive);
        f.sessions.put(&record("u1", 1), TTL).await.unwrap();
        let token = f
            .issuer
            .issue_with_generation("u1", CredentialKind::Access, 1)
            .unwrap()
            .into_token();

        let mut state = GateState::start(Some(token));
        let mut visited = vec![state.name()];
        while !state.is_terminal() {
            state = f.gate.step(state).await;
            visited.push(state.name());
        }
        assert_eq!(
            visited,
            vec![
                "credential_present",
                "credential_verified",
                "session_hydrated",
                "authorized"
            ]
        );
    }

    #[tokio::test]
    async fn test_valid_credential_without_session_rejected() {
        let f = fixture(RotationPolicy::Permissive);
        let token = f
            .issuer
            .issue("u1", CredentialKind::Access)
            .unwrap()
            .into_token();

        assert!(matches!(
            f.gate.authenticate(Some(token)).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_expired_credential_rejected_even_with_session() {
        let f = fixture(RotationPolicy::Permissive);
        f.sessions.put(&record("u1", 0), TTL).await.unwrap();
        let token = f
            .issuer
            .issue("u1", CredentialKind::Access)
            .unwrap()
            .into_token();

        f.clock.advance(time::Duration::minutes(6));
        assert!(matches!(
            f.gate.authenticate(Some(token)).await,
            Err(AuthError::InvalidOrExpiredCredential { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_credential_rejected_as_access() {
        let f = fixture(RotationPolicy::Permissive);
        f.sessions.put(&record("u1", 0), TTL).await.unwrap();
        let token = f
            .issuer
            .issue("u1", CredentialKind::Refresh)
            .unwrap()
            .into_token();

        assert!(matches!(
            f.gate.authenticate(Some(token)).await,
            Err(AuthError::InvalidOrExpiredCredential { .. })
        ));
    }

    #[tokio::test]
    async fn test_permissive_ignores_generation() {
        let f = fixture(RotationPolicy::Permissive);
        f.sessions.put(&record("u1", 5), TTL).await.unwrap();
        let token = f
            .issuer
            .issue_with_generation("u1", CredentialKind::Access, 4)
            .unwrap()
            .into_token();

        let identity = f.gate.authenticate(Some(token)).await.unwrap();
        assert_eq!(identity.subject_id, "u1");
    }

    #[tokio::test]
    async fn test_strict_rejects_stale_generation() {
        let f = fixture(RotationPolicy::Strict);
        f.sessions.put(&record("u1", 5), TTL).await.unwrap();
        let stale = f
            .issuer
            .issue_with_generation("u1", CredentialKind::Access, 4)
            .unwrap()
            .into_token();
        let current = f
            .issuer
            .issue_with_generation("u1", CredentialKind::Access, 5)
            .unwrap()
            .into_token();

        assert!(matches!(
            f.gate.authenticate(Some(stale)).await,
            Err(AuthError::InvalidOrExpiredCredential { .. })
        ));
        assert!(f.gate.authenticate(Some(current)).await.is_ok());
    }

    #[tokio::test]
    async fn test_terminal_state_is_fixed_point() {
        let f = fixture(RotationPolicy::Permissive);
        let state = f
            .gate
            .step(GateState::Rejected(AuthError::MissingCredential))
            .await;
        assert!(matches!(state, GateState::Rejected(AuthError::MissingCredential)));
    }
}
