//! Axum extractors that run the [`AuthGate`](super::AuthGate).

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{HeaderMap, header::AUTHORIZATION, request::Parts};
use axum_extra::extract::cookie::CookieJar;

use super::types::{ADMIN_ROLE, IdentityContext, authorize_roles};
use crate::config::CookieConfig;
use crate::error::AuthError;
use crate::state::AuthState;

/// Authorized identity of the caller.
///
/// The access credential is taken from `Authorization: Bearer <token>` or,
/// failing that, from the access credential cookie.
///
/// # Example
///
/// ```ignore
/// async fn handler(Authenticated(identity): Authenticated) -> impl IntoResponse {
///     Json(identity.snapshot)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub IdentityContext);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already run for this request by another extractor.
        if let Some(identity) = parts.extensions.get::<IdentityContext>() {
            return Ok(Self(identity.clone()));
        }

        let auth_state = AuthState::from_ref(state);
        let token = bearer_or_cookie_token(&parts.headers, &auth_state.config.cookies);
        let identity = auth_state.gate.authenticate(token).await?;

        parts.extensions.insert(identity.clone());
        Ok(Self(identity))
    }
}

/// Authorized identity holding the admin role.
///
/// Rejects with `Forbidden` for any other role.
#[derive(Debug, Clone)]
pub struct AdminOnly(pub IdentityContext);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Authenticated(identity) = Authenticated::from_request_parts(parts, state).await?;
        authorize_roles(&identity, &[ADMIN_ROLE])?;
        Ok(Self(identity))
    }
}

/// Finds the access credential on a request: bearer header first, then the
/// access cookie.
#[must_use]
pub fn bearer_or_cookie_token(headers: &HeaderMap, cookies: &CookieConfig) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string);
    if bearer.is_some() {
        return bearer;
    }

    CookieJar::from_headers(headers)
        .get(&cookies.access_cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
