//! Authentication and authorization error types.
//!
//! Every failure of the request gate or the refresh flow surfaces as one of
//! these variants. None of them is retried automatically; the client has to
//! authenticate again.

/// Errors that can occur during authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request carries no access credential.
    #[error("Please login to access this resource")]
    MissingCredential,

    /// The access credential failed verification or has expired.
    #[error("Access credential is invalid or expired: {reason}")]
    InvalidOrExpiredCredential {
        /// Why verification failed.
        reason: String,
    },

    /// The credential verified but no session exists for its subject.
    ///
    /// Happens after logout or when the session store evicted the entry.
    #[error("Session not found, please login again")]
    SessionNotFound,

    /// The authenticated identity's role is not allowed on this route.
    #[error("Role: {role} is not allowed to access this resource")]
    Forbidden {
        /// The role held by the caller.
        role: String,
    },

    /// The refresh credential failed verification.
    #[error("Could not refresh credentials: {reason}")]
    InvalidRefreshCredential {
        /// Why verification failed.
        reason: String,
    },

    /// The refresh credential is valid but the session it belongs to is gone.
    #[error("Session has expired, please login again")]
    SessionExpired,

    /// Email/password pair did not match a user.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A credential could not be signed.
    #[error("Signing error: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },

    /// The session store or user directory failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The request is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidOrExpiredCredential` error.
    #[must_use]
    pub fn invalid_credential(reason: impl Into<String>) -> Self {
        Self::InvalidOrExpiredCredential {
            reason: reason.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(role: impl Into<String>) -> Self {
        Self::Forbidden { role: role.into() }
    }

    /// Creates a new `InvalidRefreshCredential` error.
    #[must_use]
    pub fn invalid_refresh(reason: impl Into<String>) -> Self {
        Self::InvalidRefreshCredential {
            reason: reason.into(),
        }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
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

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code, also used as the metrics label.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidOrExpiredCredential { .. } => "invalid_or_expired_credential",
            Self::SessionNotFound => "session_not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::InvalidRefreshCredential { .. } => "invalid_refresh_credential",
            Self::SessionExpired => "session_expired",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Signing { .. } => "signing_error",
            Self::Storage { .. } => "storage_error",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Returns `true` if the client must authenticate again to proceed.
    #[must_use]
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential
                | Self::InvalidOrExpiredCredential { .. }
                | Self::SessionNotFound
                | Self::InvalidRefreshCredential { .. }
                | Self::SessionExpired
        )
    }

    /// Returns `true` if this is a server-side failure rather than a
    /// rejection of the caller.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Signing { .. } | Self::Storage { .. } | Self::Internal { .. }
        )
    }
}

impl From<learnhub_kv::KvError> for AuthError {
    fn from(err: learnhub_kv::KvError) -> Self {
        Self::storage(err.to_string())
    }
}
