//! Session records and their lifecycle.
//!
//! A session is a point-in-time copy of a user's identity stored in the
//! shared key-value store under the user's id. The request gate reads it on
//! every authenticated request instead of the user directory.
//!
//! - [`SessionRecord`] / [`IdentitySnapshot`] - the stored value
//! - [`SessionStore`] - `put` / `get` / `delete` over the key-value store
//! - [`SessionService`] - login, identity sync and logout on top of the store

mod service;
mod store;
mod types;

pub use service::{IssuedSession, SessionService};
pub use store::SessionStore;
pub use types::{IdentitySnapshot, SESSION_SCHEMA_VERSION, SessionRecord};
