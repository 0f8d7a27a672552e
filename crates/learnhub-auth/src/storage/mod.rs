//! User directory contract.
//!
//! The auth layer only needs to look users up at login and to create them on
//! first social login. Everything else about users belongs to the server.

mod collection;
mod user;

pub use collection::CollectionUserStorage;
pub use user::{User, UserBuilder, UserStorage};
