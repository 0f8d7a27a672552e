use axum::{
    Json,
    extract::{Path, State},
};
use learnhub_auth::AdminOnly;
use learnhub_storage::DocumentStore;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::notification::Notification;
use crate::state::AppState;

async fn newest_first(state: &AppState) -> ApiResult<Vec<Notification>> {
    let mut notifications = state.notifications.find_all().await?;
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(notifications)
}

/// `GET /api/v1/get-all-notifications` (admin)
pub async fn get_notifications(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let notifications = newest_first(&state).await?;
    Ok(Json(json!({ "success": true, "notifications": notifications })))
}

/// `PUT /api/v1/update-notification/{id}` (admin)
///
/// Marks one notification read and returns the full list.
pub async fn update_notification(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let notification = state
        .notifications
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;
    state
        .notifications
        .update_by_id(&id, notification.mark_read(state.clock.now()))
        .await?;

    let notifications = newest_first(&state).await?;
    Ok(Json(json!({ "success": true, "notifications": notifications })))
}
