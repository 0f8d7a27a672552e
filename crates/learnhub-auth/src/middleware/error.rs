//! HTTP responses for [`AuthError`].
//!
//! Body shape: `{"success": false, "code": "<stable code>", "message": "..."}`.
//! 401 responses carry a `WWW-Authenticate` header.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(code = self.code(), error = %message, "Auth failure");
        }

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(self.code(), &message);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        (status, headers, Json(error_body(self.code(), &message))).into_response()
    }
}

/// HTTP status for an auth error.
#[must_use]
pub fn status_for(error: &AuthError) -> StatusCode {
    match error {
        AuthError::MissingCredential
        | AuthError::InvalidOrExpiredCredential { .. }
        | AuthError::SessionNotFound
        | AuthError::InvalidRefreshCredential { .. }
        | AuthError::SessionExpired
        | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AuthError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        AuthError::Signing { .. } | AuthError::Storage { .. } | AuthError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// JSON error body shared by every LearnHub error response.
#[must_use]
pub fn error_body(code: &str, message: &str) -> serde_json::Value {
    json!({
        "success": false,
        "code": code,
        "message": message,
    })
}

fn build_www_authenticate_header(error: &str, description: &str) -> String {
    let escaped = description.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        "Bearer realm=\"learnhub\", error=\"{}\", error_description=\"{}\"",
        error, escaped
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_missing_credential_response() {
        let response = AuthError::MissingCredential.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let www_auth = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(www_auth.contains("realm=\"learnhub\""));
        assert!(www_auth.contains("error=\"missing_credential\""));
    }

    #[tokio::test]
    async fn test_forbidden_response() {
        let response = AuthError::forbidden("user").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "forbidden");
        assert_eq!(
            json["message"],
            "Role: user is not allowed to access this resource"
        );
    }

    #[tokio::test]
    async fn test_session_expired_is_unauthorized() {
        let response = AuthError::SessionExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signing_error_is_server_error() {
        let response = AuthError::signing("no secret").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_www_authenticate_header_escaping() {
        let header = build_www_authenticate_header("invalid", "has \"quotes\"");
        assert!(header.contains("\\\"quotes\\\""));
    }
}
