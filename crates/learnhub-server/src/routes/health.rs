use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::state::AppState;

/// `GET /healthz`
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /readyz`
///
/// Reports the key-value backend in use. A Redis backend that stops
/// answering makes the instance not ready.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let mode = state.kv.mode();
    match state.kv.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "kv": { "mode": mode, "reachable": true } })),
        ),
        Err(e) => {
            tracing::warn!(kv.mode = mode, error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "kv": { "mode": mode, "reachable": false, "error": e.to_string() },
                })),
            )
        }
    }
}
