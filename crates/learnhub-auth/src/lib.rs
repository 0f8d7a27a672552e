//! # learnhub-auth
//!
//! Credential and session lifecycle for the LearnHub server.
//!
//! This crate provides:
//! - Signed, time-bounded access and refresh credentials
//! - A session store adapter over the shared key-value store
//! - The request gate that turns an access credential into an identity
//! - Role checks for guarded routes
//! - Refresh-credential rotation
//! - Login, social login, logout and refresh HTTP handlers
//!
//! ## Overview
//!
//! Authenticated requests never read the primary user store. The gate
//! verifies the access credential, then hydrates identity from the session
//! store entry written at login (or at the last refresh). The snapshot can be
//! stale relative to the user record; routes that change identity state call
//! [`SessionService::sync`] to rewrite it.
//!
//! ## Modules
//!
//! - [`config`] - Secrets, lifetimes, rotation policy and cookie settings
//! - [`token`] - Credential issuing and verification
//! - [`session`] - Session records, store adapter and login orchestration
//! - [`middleware`] - Request gate, role checks and axum extractors
//! - [`refresh`] - Credential rotation
//! - [`storage`] - User directory contract
//! - [`http`] - Axum HTTP handlers for the auth endpoints

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod password;
pub mod refresh;
pub mod session;
pub mod state;
pub mod storage;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, ConfigError, CookieConfig, RotationPolicy};
pub use error::AuthError;
pub use middleware::{
    AdminOnly, AuthGate, Authenticated, GateState, IdentityContext, authorize_roles,
};
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use session::{IdentitySnapshot, IssuedSession, SessionRecord, SessionService, SessionStore};
pub use state::AuthState;
pub use storage::{CollectionUserStorage, User, UserStorage};
pub use token::{Credential, CredentialClaims, CredentialKind, CredentialPair, TokenError, TokenIssuer};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;
