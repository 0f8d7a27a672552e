//! Shared auth state for extractors and handlers.

use std::sync::Arc;

use learnhub_kv::DynKv;

use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::middleware::AuthGate;
use crate::refresh::RefreshCoordinator;
use crate::session::{SessionService, SessionStore};
use crate::storage::UserStorage;
use crate::token::TokenIssuer;

/// Everything the auth extractors and handlers need.
///
/// Include it in the application state and expose it with `FromRef`:
///
/// ```ignore
/// #[derive(Clone)]
/// struct AppState {
///     auth: AuthState,
///     // ... other state
/// }
///
/// impl FromRef<AppState> for AuthState {
///     fn from_ref(state: &AppState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AuthConfig>,
    pub issuer: Arc<TokenIssuer>,
    pub gate: AuthGate,
    pub refresher: RefreshCoordinator,
    pub sessions: SessionService,
    pub users: Arc<dyn UserStorage>,
}

impl AuthState {
    /// Wires the auth components over one key-value store handle.
    #[must_use]
    pub fn new(
        config: AuthConfig,
        kv: DynKv,
        users: Arc<dyn UserStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let issuer = Arc::new(TokenIssuer::new(&config, clock));
        let store = SessionStore::new(kv);

        Self {
            gate: AuthGate::new(issuer.clone(), store.clone(), config.rotation),
            refresher: RefreshCoordinator::new(
                issuer.clone(),
                store.clone(),
                config.rotation,
                config.session_ttl,
            ),
            sessions: SessionService::new(issuer.clone(), store, config.session_ttl),
            issuer,
            users,
            config: Arc::new(config),
        }
    }
}
