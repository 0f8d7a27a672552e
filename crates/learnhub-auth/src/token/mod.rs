//! Credential issuing and verification.
//!
//! Access and refresh credentials are HS256 JWTs signed with a
//! kind-specific secret. Expiry is checked against an injected
//! [`Clock`](crate::Clock) rather than the system time.

mod error;
mod issuer;

pub use error::TokenError;
pub use issuer::{Credential, CredentialClaims, CredentialKind, CredentialPair, TokenIssuer};
