use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use learnhub_auth::{Clock, SystemClock};
use learnhub_catalog::ReconciliationSweep;
use learnhub_kv::{DynKv, create_kv_store};
use tokio::task::JoinHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::bootstrap::bootstrap_admin_user;
use crate::cleanup::CleanupTask;
use crate::config::AppConfig;
use crate::metrics::metrics_handler;
use crate::middleware as app_middleware;
use crate::routes::{self, API_PREFIX, health};
use crate::state::AppState;

pub struct LearnhubServer {
    addr: SocketAddr,
    app: Router,
    tasks: Vec<JoinHandle<()>>,
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(metrics_handler))
        .nest(API_PREFIX, routes::api_routes())
        .route_layer(middleware::from_fn(app_middleware::http_metrics))
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            status = res.status().as_u16(),
                            latency_ms = latency.as_millis() as u64,
                            "request completed"
                        );
                    },
                ),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Starts the reconciliation sweep and the cleanup task, as configured.
pub fn spawn_background_tasks(state: &AppState) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();
    let cfg = &state.config;

    if cfg.cache.reconciliation.enabled {
        let sweep = ReconciliationSweep::new(
            state.courses.invalidator().clone(),
            cfg.cache.reconciliation.interval,
            cfg.cache.reconciliation.batch_size,
        );
        tasks.push(sweep.start());
    }

    if cfg.cleanup.enabled {
        let cleanup = CleanupTask::new(
            state.notifications.clone(),
            state.kv.clone(),
            state.clock.clone(),
            cfg.cleanup.interval,
            cfg.cleanup.retention,
        );
        tasks.push(cleanup.start());
    }

    tasks
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    kv: Option<DynKv>,
    clock: Arc<dyn Clock>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            kv: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Uses this key-value store instead of the one `redis` configures.
    pub fn with_kv(mut self, kv: DynKv) -> Self {
        self.kv = Some(kv);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Connects the stores, creates the bootstrap admin and starts the
    /// background tasks.
    pub async fn build(self) -> anyhow::Result<LearnhubServer> {
        crate::metrics::init_metrics();

        let kv = match self.kv {
            Some(kv) => kv,
            None => create_kv_store(&self.config.redis).await,
        };
        tracing::info!(kv.mode = kv.mode(), "Key-value store ready");

        let state = AppState::new(self.config, kv, self.clock);
        if let Some(admin) = state.config.bootstrap.admin_user.clone() {
            bootstrap_admin_user(&state, &admin).await?;
        }

        let tasks = spawn_background_tasks(&state);

        Ok(LearnhubServer {
            addr: self.addr,
            app: build_app(state),
            tasks,
        })
    }
}

impl LearnhubServer {
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        let result = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        for task in &self.tasks {
            task.abort();
        }
        result?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use learnhub_kv::MemoryKv;
    use tower::ServiceExt;

    fn app() -> Router {
        let mut cfg = AppConfig::default();
        cfg.auth.access_token_secret = "a".into();
        cfg.auth.refresh_token_secret = "b".into();
        build_app(AppState::new(cfg, Arc::new(MemoryKv::new()), Arc::new(SystemClock)))
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let res = app()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_request_id_is_preserved() {
        let res = app()
            .oneshot(
                Request::get("/healthz")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_routes_are_mounted_under_api_prefix() {
        let res = app()
            .oneshot(Request::get("/api/v1/get-courses").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app()
            .oneshot(Request::get("/get-courses").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_background_tasks_follow_config() {
        let mut cfg = AppConfig::default();
        cfg.cleanup.enabled = false;
        let state = AppState::new(cfg, Arc::new(MemoryKv::new()), Arc::new(SystemClock));
        let tasks = spawn_background_tasks(&state);
        assert_eq!(tasks.len(), 1);
        for task in tasks {
            task.abort();
        }
    }
}
