use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::TokenError;
use crate::{AuthConfig, Clock};

/// The two credential kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    /// Short-lived credential presented on every request.
    Access,
    /// Longer-lived credential exchanged for a new pair.
    Refresh,
}

impl CredentialKind {
    /// Returns the lowercase name used in claims and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by every credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Subject (user) identifier.
    pub sub: String,
    /// Declared credential kind.
    pub kind: CredentialKind,
    /// Issued at, unix seconds.
    pub iat: i64,
    /// Expires at, unix seconds.
    pub exp: i64,
    /// Unique credential id.
    pub jti: String,
    /// Session generation the credential was minted for.
    #[serde(rename = "gen", default)]
    pub generation: u64,
}

impl CredentialClaims {
    /// Returns the expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.exp).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// Returns the issue time as a timestamp.
    #[must_use]
    pub fn issued_at(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.iat).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// Returns `true` if the credential is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now.unix_timestamp() >= self.exp
    }
}

/// A signed credential and the claims it carries.
#[derive(Debug, Clone)]
pub struct Credential {
    token: String,
    claims: CredentialClaims,
}

impl Credential {
    /// Returns the encoded credential.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the claims.
    #[must_use]
    pub fn claims(&self) -> &CredentialClaims {
        &self.claims
    }

    /// Consumes the credential, returning the encoded form.
    #[must_use]
    pub fn into_token(self) -> String {
        self.token
    }
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct CredentialPair {
    /// Access credential.
    pub access: Credential,
    /// Refresh credential.
    pub refresh: Credential,
}

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KindKeys {
    fn from_secret(secret: &str) -> Option<Self> {
        if secret.is_empty() {
            return None;
        }
        Some(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }
}

/// Issues and verifies access and refresh credentials.
///
/// Signing is deterministic for a given secret, claims and clock reading.
/// The issuer holds no other state.
pub struct TokenIssuer {
    access: Option<KindKeys>,
    refresh: Option<KindKeys>,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_configured", &self.access.is_some())
            .field("refresh_configured", &self.refresh.is_some())
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer from the auth configuration.
    ///
    /// An empty secret leaves that kind unconfigured; issuing it then fails
    /// with [`TokenError::Signing`].
    #[must_use]
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            access: KindKeys::from_secret(&config.access_token_secret),
            refresh: KindKeys::from_secret(&config.refresh_token_secret),
            access_lifetime: config.access_token_lifetime,
            refresh_lifetime: config.refresh_token_lifetime,
            clock,
        }
    }

    /// Returns the configured lifetime for `kind`.
    #[must_use]
    pub fn lifetime(&self, kind: CredentialKind) -> Duration {
        match kind {
            CredentialKind::Access => self.access_lifetime,
            CredentialKind::Refresh => self.refresh_lifetime,
        }
    }

    fn keys(&self, kind: CredentialKind) -> Option<&KindKeys> {
        match kind {
            CredentialKind::Access => self.access.as_ref(),
            CredentialKind::Refresh => self.refresh.as_ref(),
        }
    }

    /// Issues a credential of `kind` for `subject` at generation 0.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if no secret is configured for `kind`.
    pub fn issue(&self, subject: &str, kind: CredentialKind) -> Result<Credential, TokenError> {
        self.issue_with_generation(subject, kind, 0)
    }

    /// Issues a credential of `kind` for `subject` bound to a session
    /// generation.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if no secret is configured for `kind`
    /// or encoding fails.
    pub fn issue_with_generation(
        &self,
        subject: &str,
        kind: CredentialKind,
        generation: u64,
    ) -> Result<Credential, TokenError> {
        let keys = self
            .keys(kind)
            .ok_or_else(|| TokenError::signing(kind, "no secret configured"))?;

        let now = self.clock.now().unix_timestamp();
        let lifetime = i64::try_from(self.lifetime(kind).as_secs()).unwrap_or(i64::MAX);
        let claims = CredentialClaims {
            sub: subject.to_string(),
            kind,
            iat: now,
            exp: now.saturating_add(lifetime),
            jti: Uuid::new_v4().to_string(),
            generation,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| TokenError::signing(kind, e.to_string()))?;

        Ok(Credential { token, claims })
    }

    /// Issues an access and a refresh credential for the same subject and
    /// generation. Nothing is returned unless both succeed.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if either kind cannot be signed.
    pub fn issue_pair(&self, subject: &str, generation: u64) -> Result<CredentialPair, TokenError> {
        let access = self.issue_with_generation(subject, CredentialKind::Access, generation)?;
        let refresh = self.issue_with_generation(subject, CredentialKind::Refresh, generation)?;
        Ok(CredentialPair { access, refresh })
    }

    /// Verifies `token` as a credential of `kind` and returns its subject.
    ///
    /// # Errors
    ///
    /// - `TokenError::Expired` if the clock is at or past `exp`
    /// - `TokenError::InvalidSignature` if the signature does not match the
    ///   secret for `kind`, or the credential declares another kind
    /// - `TokenError::Malformed` if the token cannot be parsed
    pub fn verify(&self, token: &str, kind: CredentialKind) -> Result<String, TokenError> {
        self.decode(token, kind).map(|claims| claims.sub)
    }

    /// Verifies `token` as a credential of `kind` and returns its claims.
    ///
    /// # Errors
    ///
    /// Same as [`verify`](Self::verify).
    pub fn decode(&self, token: &str, kind: CredentialKind) -> Result<CredentialClaims, TokenError> {
        // Without a secret nothing of this kind can have been issued here.
        let keys = self.keys(kind).ok_or(TokenError::InvalidSignature)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<CredentialClaims>(token, &keys.decoding, &validation)?;
        let claims = data.claims;

        if claims.kind != kind {
            return Err(TokenError::InvalidSignature);
        }
        if claims.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use time::macros::datetime;

    fn config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret".to_string(),
            refresh_token_secret: "refresh-secret".to_string(),
            ..AuthConfig::default()
        }
    }

    fn issuer_at(clock: Arc<ManualClock>) -> TokenIssuer {
        TokenIssuer::new(&config(), clock)
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(datetime!(2024-03-01 12:00 UTC)))
    }

    #[test]
    fn test_issue_and_verify_access() {
        let issuer = issuer_at(clock());
        let credential = issuer.issue("u1", CredentialKind::Access).unwrap();

        assert_eq!(credential.claims().sub, "u1");
        assert_eq!(credential.claims().kind, CredentialKind::Access);
        assert_eq!(credential.claims().exp - credential.claims().iat, 300);
        assert_eq!(
            issuer.verify(credential.token(), CredentialKind::Access).unwrap(),
            "u1"
        );
    }

    #[test]
    fn test_refresh_lifetime_is_three_days() {
        let issuer = issuer_at(clock());
        let credential = issuer.issue("u1", CredentialKind::Refresh).unwrap();
        assert_eq!(credential.claims().exp - credential.claims().iat, 3 * 24 * 3600);
    }

    #[test]
    fn test_missing_secret_is_signing_error() {
        let config = AuthConfig {
            refresh_token_secret: String::new(),
            ..config()
        };
        let issuer = TokenIssuer::new(&config, clock());

        assert!(issuer.issue("u1", CredentialKind::Access).is_ok());
        let err = issuer.issue("u1", CredentialKind::Refresh).unwrap_err();
        assert!(matches!(
            err,
            TokenError::Signing {
                kind: CredentialKind::Refresh,
                ..
            }
        ));
        assert!(issuer.issue_pair("u1", 0).is_err());
    }

    #[test]
    fn test_expired_at_boundary() {
        let clock = clock();
        let issuer = issuer_at(clock.clone());
        let credential = issuer.issue("u1", CredentialKind::Access).unwrap();

        clock.advance(time::Duration::seconds(299));
        assert!(issuer.verify(credential.token(), CredentialKind::Access).is_ok());

        clock.advance(time::Duration::seconds(1));
        assert!(matches!(
            issuer.verify(credential.token(), CredentialKind::Access),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_refresh_token_never_passes_as_access() {
        let issuer = issuer_at(clock());
        let refresh = issuer.issue("u1", CredentialKind::Refresh).unwrap();

        assert!(matches!(
            issuer.verify(refresh.token(), CredentialKind::Access),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_kind_claim_checked_even_with_shared_secret() {
        let shared = AuthConfig {
            access_token_secret: "same".to_string(),
            refresh_token_secret: "same".to_string(),
            ..AuthConfig::default()
        };
        let issuer = TokenIssuer::new(&shared, clock());
        let refresh = issuer.issue("u1", CredentialKind::Refresh).unwrap();

        assert!(matches!(
            issuer.verify(refresh.token(), CredentialKind::Access),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_foreign_secret_is_invalid_signature() {
        let other = TokenIssuer::new(
            &AuthConfig {
                access_token_secret: "someone-else".to_string(),
                refresh_token_secret: "someone-else-refresh".to_string(),
                ..AuthConfig::default()
            },
            clock(),
        );
        let credential = other.issue("u1", CredentialKind::Access).unwrap();

        let issuer = issuer_at(clock());
        assert!(matches!(
            issuer.verify(credential.token(), CredentialKind::Access),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let issuer = issuer_at(clock());
        let err = issuer.verify("not-a-jwt", CredentialKind::Access).unwrap_err();
        assert!(matches!(err, TokenError::Malformed { .. }));
        assert!(err.is_verification_error());
    }

    #[test]
    fn test_generation_is_embedded() {
        let issuer = issuer_at(clock());
        let pair = issuer.issue_pair("u1", 42).unwrap();
        assert_eq!(pair.access.claims().generation, 42);
        assert_eq!(pair.refresh.claims().generation, 42);

        let claims = issuer
            .decode(pair.refresh.token(), CredentialKind::Refresh)
            .unwrap();
        assert_eq!(claims.generation, 42);
    }

    #[test]
    fn test_each_credential_has_unique_id() {
        let issuer = issuer_at(clock());
        let a = issuer.issue("u1", CredentialKind::Access).unwrap();
        let b = issuer.issue("u1", CredentialKind::Access).unwrap();
        assert_ne!(a.claims().jti, b.claims().jti);
        assert_ne!(a.token(), b.token());
    }
}
