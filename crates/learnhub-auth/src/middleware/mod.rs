//! Request authentication and authorization.
//!
//! - [`AuthGate`] - access credential → session → identity, as an explicit
//!   state machine
//! - [`authorize_roles`] - role check on an authorized identity
//! - [`Authenticated`] / [`AdminOnly`] - axum extractors running the gate
//! - `IntoResponse` for [`AuthError`](crate::AuthError)
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use learnhub_auth::Authenticated;
//!
//! async fn me(Authenticated(identity): Authenticated) -> String {
//!     format!("Hello, {}!", identity.snapshot.name)
//! }
//!
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .with_state(auth_state);
//! ```

pub mod error;
pub mod extract;
pub mod gate;
pub mod types;

pub use error::error_body;
pub use extract::{AdminOnly, Authenticated, bearer_or_cookie_token};
pub use gate::{AuthGate, GateState};
pub use types::{IdentityContext, authorize_roles};
