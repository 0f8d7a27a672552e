//! Admin analytics: creations per 28-day window.

use axum::{Json, extract::State};
use learnhub_auth::AdminOnly;
use learnhub_storage::DocumentStore;
use serde_json::{Value, json};

use crate::analytics::last_12_months;
use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/v1/get-users-analytics` (admin)
pub async fn users_analytics(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let users = state.users.find_all().await?;
    let counts = last_12_months(&users, state.clock.now());
    Ok(Json(json!({ "success": true, "users": counts })))
}

/// `GET /api/v1/get-courses-analytics` (admin)
pub async fn courses_analytics(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let courses = state.courses.collection().find_all().await?;
    let counts = last_12_months(&courses, state.clock.now());
    Ok(Json(json!({ "success": true, "courses": counts })))
}

/// `GET /api/v1/get-orders-analytics` (admin)
pub async fn orders_analytics(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let orders = state.orders.find_all().await?;
    let counts = last_12_months(&orders, state.clock.now());
    Ok(Json(json!({ "success": true, "orders": counts })))
}
