use axum::{Json, extract::State};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use super::cookies::set_credential_cookies;
use crate::error::AuthError;
use crate::middleware::Authenticated;
use crate::password::verify_password;
use crate::session::{IdentitySnapshot, IssuedSession};
use crate::state::AuthState;
use crate::storage::User;
use crate::token::CredentialPair;

/// Email/password login body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Social login body, as forwarded by the frontend after the provider
/// flow completed.
#[derive(Debug, Deserialize)]
pub struct SocialLoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub avatar: Option<String>,
}

/// Body returned by login, social login and refresh.
///
/// Both credentials are returned so clients without a cookie jar can send
/// the current refresh credential back in the refresh body.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub subject_id: String,
    pub user: IdentitySnapshot,
    pub access_token: String,
    pub refresh_token: String,
}

impl SessionResponse {
    pub(crate) fn new(
        subject_id: String,
        user: IdentitySnapshot,
        credentials: CredentialPair,
    ) -> Self {
        Self {
            success: true,
            subject_id,
            user,
            access_token: credentials.access.into_token(),
            refresh_token: credentials.refresh.into_token(),
        }
    }
}

fn respond(state: &AuthState, jar: CookieJar, issued: IssuedSession) -> (CookieJar, Json<SessionResponse>) {
    let jar = set_credential_cookies(
        jar,
        &state.config.cookies,
        &issued.credentials,
        state.config.access_token_lifetime,
        state.config.refresh_token_lifetime,
    );
    let body = SessionResponse::new(
        issued.record.subject_id,
        issued.record.snapshot,
        issued.credentials,
    );
    (jar, Json(body))
}

/// `POST /login`
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login_handler(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AuthError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AuthError::invalid_request("Please enter email and password"));
    }

    let user = state
        .users
        .find_by_email(request.email.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let matches = user
        .password_hash
        .as_deref()
        .is_some_and(|hash| verify_password(&request.password, hash));
    if !matches {
        tracing::debug!(subject = %user.id, "Password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    let issued = state.sessions.establish(&user).await?;
    Ok(respond(&state, jar, issued))
}

/// `POST /social-auth`
///
/// Creates the account on first use with the default role.
pub async fn social_login_handler(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(request): Json<SocialLoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AuthError> {
    if request.email.trim().is_empty() || request.name.trim().is_empty() {
        return Err(AuthError::invalid_request("Please enter name and email"));
    }

    let user = match state.users.find_by_email(request.email.trim()).await? {
        Some(user) => user,
        None => {
            let mut user = User::new(request.name.trim(), request.email.trim());
            user.avatar = request.avatar;
            let user = state.users.create(user).await?;
            tracing::info!(subject = %user.id, "Account created through social login");
            user
        }
    };

    let issued = state.sessions.establish(&user).await?;
    Ok(respond(&state, jar, issued))
}

/// `GET /me`
///
/// Returns the session snapshot, not the user record.
pub async fn me_handler(Authenticated(identity): Authenticated) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "subject_id": identity.subject_id,
        "user": identity.snapshot,
    }))
}
