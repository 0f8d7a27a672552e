//! Identity attached to authorized requests.

use crate::error::AuthError;
use crate::session::{IdentitySnapshot, SessionRecord};
use crate::token::CredentialClaims;

/// Role allowed on admin routes.
pub const ADMIN_ROLE: &str = "admin";

/// Identity of an authorized request.
///
/// Built from the session snapshot, never from the user directory, so it
/// reflects identity as of the last login, refresh or sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub subject_id: String,
    pub role: String,
    pub course_ids: Vec<String>,
    pub snapshot: IdentitySnapshot,
    /// Claims of the access credential that authorized the request.
    pub claims: CredentialClaims,
}

impl IdentityContext {
    /// Builds the context from a verified credential and its session.
    #[must_use]
    pub fn from_session(claims: CredentialClaims, record: SessionRecord) -> Self {
        let snapshot = record.snapshot;
        Self {
            subject_id: record.subject_id,
            role: snapshot.role.clone(),
            course_ids: snapshot.course_ids.clone(),
            snapshot,
            claims,
        }
    }

    /// Returns `true` if the identity holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Returns `true` if the identity holds any of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    /// Returns `true` if `course_id` is among the purchased courses.
    #[must_use]
    pub fn owns_course(&self, course_id: &str) -> bool {
        self.course_ids.iter().any(|id| id == course_id)
    }

    /// Returns `true` for the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Rejects `identity` with `Forbidden` unless its role is in `allowed`.
///
/// # Errors
///
/// Returns `AuthError::Forbidden` naming the caller's role.
pub fn authorize_roles(identity: &IdentityContext, allowed: &[&str]) -> Result<(), AuthError> {
    if identity.has_any_role(allowed) {
        Ok(())
    } else {
        tracing::debug!(
            subject = %identity.subject_id,
            role = %identity.role,
            ?allowed,
            "Role not allowed"
        );
        metrics::counter!("auth_rejections_total", "reason" => "forbidden").increment(1);
        Err(AuthError::forbidden(identity.role.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::CredentialKind;

    fn identity(role: &str) -> IdentityContext {
        let snapshot = IdentitySnapshot {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: role.to_string(),
            avatar: None,
            course_ids: vec!["c1".to_string()],
        };
        let claims = CredentialClaims {
            sub: "u1".to_string(),
            kind: CredentialKind::Access,
            iat: 0,
            exp: 300,
            jti: "j".to_string(),
            generation: 1,
        };
        IdentityContext::from_session(claims, SessionRecord::new("u1", 1, snapshot))
    }

    #[test]
    fn test_user_forbidden_on_admin_route() {
        let err = authorize_roles(&identity("user"), &["admin"]).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { ref role } if role == "user"));
    }

    #[test]
    fn test_allowed_role_passes() {
        assert!(authorize_roles(&identity("admin"), &["admin"]).is_ok());
        assert!(authorize_roles(&identity("user"), &["user", "admin"]).is_ok());
    }

    #[test]
    fn test_empty_allowed_set_rejects_everyone() {
        assert!(authorize_roles(&identity("admin"), &[]).is_err());
    }

    #[test]
    fn test_owns_course() {
        let identity = identity("user");
        assert!(identity.owns_course("c1"));
        assert!(!identity.owns_course("c2"));
        assert_eq!(identity.subject_id, "u1");
    }
}
