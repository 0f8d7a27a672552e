//! Error type for the server's own routes.
//!
//! Auth and catalog failures keep the responses their crates define; the
//! remaining variants use the same `{success, code, message}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use learnhub_auth::AuthError;
use learnhub_auth::middleware::error_body;
use learnhub_catalog::CatalogError;
use learnhub_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    /// Authenticated caller is not enrolled in the requested course.
    #[error("You are not eligible to access this course")]
    NotEnrolled,
    #[error(transparent)]
    Storage(StorageError),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        if e.is_not_found() {
            Self::NotFound(e.to_string())
        } else {
            Self::Storage(e)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code) = match self {
            Self::Auth(e) => return e.into_response(),
            Self::Catalog(e) => return e.into_response(),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::NotEnrolled => (StatusCode::FORBIDDEN, "not_enrolled"),
            Self::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
        };
        (status, Json(error_body(code, &message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
