//! HTTP handlers for the credential lifecycle.
//!
//! | Handler | Purpose |
//! |---------|---------|
//! | [`login_handler`] | Email/password login, sets both credential cookies |
//! | [`social_login_handler`] | Find-or-create by email, then as login |
//! | [`logout_handler`] | Deletes the session, clears both cookies |
//! | [`refresh_handler`] | Rotates the refresh credential |
//! | [`me_handler`] | Returns the caller's session snapshot |
//!
//! Handlers take `State<AuthState>`, so they can be mounted on any router
//! whose state implements `FromRef` for [`AuthState`](crate::AuthState).

mod cookies;
mod login;
mod logout;
mod refresh;

pub use cookies::{clear_credential_cookies, credential_cookie, set_credential_cookies};
pub use login::{
    LoginRequest, SessionResponse, SocialLoginRequest, login_handler, me_handler,
    social_login_handler,
};
pub use logout::logout_handler;
pub use refresh::{RefreshRequest, refresh_handler};
