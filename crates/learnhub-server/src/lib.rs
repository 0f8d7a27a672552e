pub mod analytics;
pub mod bootstrap;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod middleware;
pub mod notification;
pub mod observability;
pub mod order;
pub mod routes;
pub mod server;
pub mod state;

pub use cleanup::{CleanupReport, CleanupTask};
pub use config::{AppConfig, BootstrapConfig, CleanupConfig, LoggingConfig, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use layout::{Layout, LayoutInput, LayoutKind};
pub use notification::{Notification, NotificationStatus};
pub use observability::init_tracing;
pub use order::Order;
pub use server::{LearnhubServer, ServerBuilder, build_app, spawn_background_tasks};
pub use state::AppState;
