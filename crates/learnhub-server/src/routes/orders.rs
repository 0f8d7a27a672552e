//! Enrollment and orders.

use axum::{Json, extract::State, http::StatusCode};
use learnhub_auth::{AdminOnly, Authenticated};
use learnhub_storage::DocumentStore;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::notification::Notification;
use crate::order::Order;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub payment_info: Option<Value>,
}

/// `POST /api/v1/enroll-course`, also mounted as `/create-order`
///
/// Adds the course to the caller's account, stores an order, counts the
/// purchase, notifies admins and rewrites the caller's session snapshot.
pub async fn enroll_course(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Json(request): Json<EnrollRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let course_id = request.course_id.trim();
    if course_id.is_empty() {
        return Err(ApiError::bad_request("Please provide course_id"));
    }

    let mut user = state
        .users
        .find_by_id(&identity.subject_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    if user.course_ids.iter().any(|id| id == course_id) {
        return Err(ApiError::bad_request("You have already purchased this course"));
    }

    let course = state.courses.get(course_id).await?;

    user.course_ids.push(course.id.clone());
    let user = state.users.update_by_id(&user.id.clone(), user).await?;
    let course = state.courses.record_purchase(&course.id).await?;
    let order = state
        .orders
        .create(Order::new(
            &course.id,
            &user.id,
            request.payment_info,
            state.clock.now(),
        ))
        .await?;

    state
        .notify(
            Notification::new(
                "New order",
                format!("You have a new order from {}", course.name),
                state.clock.now(),
            )
            .about(user.id.clone()),
        )
        .await;

    state.auth.sessions.sync(&user).await?;
    tracing::info!(
        subject = %user.id,
        course_id = %course.id,
        order_id = %order.id,
        "User enrolled"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "order": order,
            "course": course.public_view(),
        })),
    ))
}

/// `GET /api/v1/get-orders` (admin), newest first.
pub async fn get_orders(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let mut orders = state.orders.find_all().await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(json!({ "success": true, "orders": orders })))
}
