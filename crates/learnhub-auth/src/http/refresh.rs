use axum::{Json, body::Bytes, extract::State};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::cookies::set_credential_cookies;
use super::login::SessionResponse;
use crate::error::AuthError;
use crate::state::AuthState;

/// Optional refresh body for clients that do not keep cookies.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// `GET|POST /refresh`
///
/// Reads the refresh credential from its cookie, or from a JSON body
/// `{"refresh_token": "..."}`.
pub async fn refresh_handler(
    State(state): State<AuthState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<SessionResponse>), AuthError> {
    let from_cookie = jar
        .get(&state.config.cookies.refresh_cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());

    let token = match from_cookie {
        Some(token) => token,
        None => {
            let request: RefreshRequest = if body.is_empty() {
                RefreshRequest::default()
            } else {
                serde_json::from_slice(&body)
                    .map_err(|e| AuthError::invalid_request(format!("Invalid body: {e}")))?
            };
            request
                .refresh_token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| AuthError::invalid_refresh("no refresh credential presented"))?
        }
    };

    let outcome = state.refresher.refresh(&token).await?;
    let jar = set_credential_cookies(
        jar,
        &state.config.cookies,
        &outcome.credentials,
        state.config.access_token_lifetime,
        state.config.refresh_token_lifetime,
    );
    let body = SessionResponse::new(
        outcome.record.subject_id,
        outcome.record.snapshot,
        outcome.credentials,
    );
    Ok((jar, Json(body)))
}
