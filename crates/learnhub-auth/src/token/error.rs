use super::CredentialKind;

/// Errors from issuing or verifying a credential.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// No secret is configured for this credential kind, or encoding failed.
    #[error("Cannot sign {kind} credential: {message}")]
    Signing {
        /// Credential kind that was being signed.
        kind: CredentialKind,
        /// Description of the failure.
        message: String,
    },

    /// The credential is past its expiry.
    #[error("Credential has expired")]
    Expired,

    /// The signature does not verify against the secret for the requested
    /// kind, or the credential declares a different kind.
    #[error("Credential signature is invalid")]
    InvalidSignature,

    /// The credential could not be parsed.
    #[error("Malformed credential: {message}")]
    Malformed {
        /// Description of the parse failure.
        message: String,
    },
}

impl TokenError {
    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(kind: CredentialKind, message: impl Into<String>) -> Self {
        Self::Signing {
            kind,
            message: message.into(),
        }
    }

    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a verification failure rather than an
    /// issuing failure.
    #[must_use]
    pub fn is_verification_error(&self) -> bool {
        !matches!(self, Self::Signing { .. })
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::InvalidSignature,
            _ => Self::malformed(err.to_string()),
        }
    }
}
