use std::sync::Arc;

use axum::extract::FromRef;
use learnhub_auth::{AuthState, Clock, CollectionUserStorage, User};
use learnhub_catalog::{CatalogCache, CourseService, Invalidator, PendingInvalidations};
use learnhub_kv::DynKv;
use learnhub_storage::{DocumentStore, DynCollection, MemoryCollection};

use crate::config::AppConfig;
use crate::layout::Layout;
use crate::notification::Notification;
use crate::order::Order;

/// Application state shared by every handler.
///
/// Each component receives its store handles here; nothing reaches for a
/// process-wide connection.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthState,
    pub courses: CourseService,
    pub users: DynCollection<User>,
    pub notifications: DynCollection<Notification>,
    pub orders: DynCollection<Order>,
    pub layouts: DynCollection<Layout>,
    pub kv: DynKv,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wires the components over in-process document collections and the
    /// given key-value store.
    pub fn new(config: AppConfig, kv: DynKv, clock: Arc<dyn Clock>) -> Self {
        let users: DynCollection<User> = Arc::new(MemoryCollection::new());
        let notifications: DynCollection<Notification> = Arc::new(MemoryCollection::new());

        let auth = AuthState::new(
            config.auth.clone(),
            kv.clone(),
            Arc::new(CollectionUserStorage::new(users.clone())),
            clock.clone(),
        );

        let cache = CatalogCache::new(kv.clone(), config.cache.resource_ttl);
        let invalidator = Invalidator::new(
            cache.clone(),
            config.cache.invalidation.clone(),
            PendingInvalidations::new(),
        );
        let courses = CourseService::new(Arc::new(MemoryCollection::new()), cache, invalidator);

        Self {
            config: Arc::new(config),
            auth,
            courses,
            users,
            notifications,
            orders: Arc::new(MemoryCollection::new()),
            layouts: Arc::new(MemoryCollection::new()),
            kv,
            clock,
        }
    }

    /// Stores an admin notification. A failure is logged and otherwise
    /// ignored: the action that triggered it has already happened.
    pub async fn notify(&self, notification: Notification) {
        let title = notification.title.clone();
        if let Err(e) = self.notifications.create(notification).await {
            tracing::warn!(title = %title, error = %e, "Failed to create notification");
        }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
