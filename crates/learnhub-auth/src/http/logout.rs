use axum::{Json, extract::State};
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};

use super::cookies::clear_credential_cookies;
use crate::error::AuthError;
use crate::middleware::Authenticated;
use crate::state::AuthState;

/// `GET /logout`
///
/// Deletes the session and clears both cookies. Credentials already handed
/// out stay cryptographically valid, but the gate rejects them with
/// `SessionNotFound` from now on.
pub async fn logout_handler(
    State(state): State<AuthState>,
    Authenticated(identity): Authenticated,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AuthError> {
    state.sessions.end(&identity.subject_id).await?;
    let jar = clear_credential_cookies(jar, &state.config.cookies);
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Logged out successfully",
        })),
    ))
}
