//! Cache and catalog errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Cache-layer failures.
///
/// None of these reach a caller of
/// [`get_or_populate`](crate::CatalogCache::get_or_populate); they are logged
/// and handled as a miss. They surface from `invalidate` so the retry layer can act on them.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No entry for the key.
    #[error("Cache miss for {key}")]
    Miss {
        /// Store key.
        key: String,
    },

    /// The key-value store could not be reached.
    #[error("Cache store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The stored payload has an unknown schema or version, or is corrupt.
    #[error("Cached payload for {key} could not be decoded: {message}")]
    Decode {
        /// Store key.
        key: String,
        /// Description of the failure.
        message: String,
    },

    /// The payload could not be serialized.
    #[error("Payload for {key} could not be encoded: {message}")]
    Encode {
        /// Store key.
        key: String,
        /// Description of the failure.
        message: String,
    },
}

impl CacheError {
    /// Creates a new `Miss` error.
    #[must_use]
    pub fn miss(key: impl Into<String>) -> Self {
        Self::Miss { key: key.into() }
    }

    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Encode` error.
    #[must_use]
    pub fn encode(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl From<learnhub_kv::KvError> for CacheError {
    fn from(err: learnhub_kv::KvError) -> Self {
        Self::unavailable(err.to_string())
    }
}

/// Errors returned by [`CourseService`](crate::CourseService).
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The course does not exist.
    #[error("Course not found: {id}")]
    NotFound {
        /// Course id.
        id: String,
    },

    /// A section, question or review of an existing course does not exist.
    #[error("{kind} not found: {id}")]
    MissingItem {
        /// What was looked up.
        kind: &'static str,
        /// Its id.
        id: String,
    },

    /// The input failed validation.
    #[error("Invalid course: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },

    /// The document store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the failure.
        message: String,
    },
}

impl CatalogError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a new `MissingItem` error.
    #[must_use]
    pub fn missing_item(kind: &'static str, id: impl Into<String>) -> Self {
        Self::MissingItem {
            kind,
            id: id.into(),
        }
    }

    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::MissingItem { .. } => "not_found",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Storage { .. } => "storage_error",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::MissingItem { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<learnhub_storage::StorageError> for CatalogError {
    fn from(err: learnhub_storage::StorageError) -> Self {
        match err {
            learnhub_storage::StorageError::NotFound { id, .. } => Self::not_found(id),
            learnhub_storage::StorageError::InvalidDocument { message } => {
                Self::invalid_input(message)
            }
            other => Self::storage(other.to_string()),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Catalog failure");
        }
        let body = json!({
            "success": false,
            "code": self.code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
