//! Layout routes.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use learnhub_auth::AdminOnly;
use learnhub_storage::DocumentStore;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::layout::{LayoutInput, LayoutKind};
use crate::state::AppState;

/// `POST /api/v1/create-layout` (admin)
pub async fn create_layout(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
    Json(input): Json<LayoutInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let kind = input.kind;
    if state.layouts.find_by_id(kind.as_str()).await?.is_some() {
        return Err(ApiError::bad_request(format!("{kind} already exists")));
    }
    let layout = input
        .into_layout(state.clock.now())
        .map_err(ApiError::bad_request)?;
    let layout = state.layouts.create(layout).await?;
    tracing::info!(kind = %kind, "Layout created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "layout": layout })),
    ))
}

/// `PUT /api/v1/edit-layout` (admin)
pub async fn edit_layout(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
    Json(input): Json<LayoutInput>,
) -> ApiResult<Json<Value>> {
    let kind = input.kind;
    let layout = input
        .into_layout(state.clock.now())
        .map_err(ApiError::bad_request)?;
    // update_by_id reports a missing layout as not found
    let layout = state.layouts.update_by_id(kind.as_str(), layout).await?;
    tracing::info!(kind = %kind, "Layout updated");
    Ok(Json(json!({ "success": true, "layout": layout })))
}

#[derive(Debug, Deserialize)]
pub struct LayoutQuery {
    #[serde(rename = "type")]
    pub kind: LayoutKind,
}

/// `GET /api/v1/get-layout?type=<Banner|FAQ|Categories>`
pub async fn get_layout(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> ApiResult<Json<Value>> {
    let layout = state
        .layouts
        .find_by_id(query.kind.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} layout not found", query.kind)))?;
    Ok(Json(json!({ "success": true, "layout": layout })))
}
