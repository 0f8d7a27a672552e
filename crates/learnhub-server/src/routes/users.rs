//! Account routes that change identity state.
//!
//! Login, social login, logout, refresh and `me` are the handlers from
//! `learnhub_auth::http`. The routes here write the user record and then
//! rewrite the caller's (or the target's) session snapshot.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use learnhub_auth::password::{hash_password, verify_password};
use learnhub_auth::{AdminOnly, AuthError, Authenticated, User};
use learnhub_storage::DocumentStore;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::notification::Notification;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;
const ROLES: [&str; 2] = ["user", "admin"];

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /api/v1/registration`
///
/// Creates the account directly. There is no activation step.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegistrationRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let name = request.name.trim();
    let email = request.email.trim();
    if name.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Please enter name, email and password"));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let hash = hash_password(&request.password)?;
    let user = state
        .auth
        .users
        .create(User::builder(name, email).password_hash(hash).build())
        .await?;
    tracing::info!(subject = %user.id, "Account registered");

    state
        .notify(
            Notification::new(
                "New user",
                format!("{} created an account", user.name),
                state.clock.now(),
            )
            .about(user.id.clone()),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "user": user })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateInfoRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// `PUT /api/v1/update-user-info`
pub async fn update_user_info(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Json(request): Json<UpdateInfoRequest>,
) -> ApiResult<Json<Value>> {
    let mut user = load_user(&state, &identity.subject_id).await?;
    if let Some(name) = request.name.map(|n| n.trim().to_string()) {
        if name.is_empty() {
            return Err(ApiError::bad_request("Name must not be empty"));
        }
        user.name = name;
    }
    if let Some(avatar) = request.avatar {
        user.avatar = Some(avatar);
    }

    let user = state.users.update_by_id(&user.id.clone(), user).await?;
    state.auth.sessions.sync(&user).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// `PUT /api/v1/update-user-password`
///
/// Accounts created through social login have no password to change.
pub async fn update_user_password(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Json(request): Json<UpdatePasswordRequest>,
) -> ApiResult<Json<Value>> {
    if request.old_password.is_empty() || request.new_password.is_empty() {
        return Err(ApiError::bad_request("Please enter old and new password"));
    }
    if request.new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let mut user = load_user(&state, &identity.subject_id).await?;
    let Some(current) = user.password_hash.as_deref() else {
        return Err(ApiError::bad_request("Account has no password"));
    };
    if !verify_password(&request.old_password, current) {
        return Err(AuthError::InvalidCredentials.into());
    }

    user.password_hash = Some(hash_password(&request.new_password)?);
    state.users.update_by_id(&user.id.clone(), user).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub role: String,
}

/// `PUT /api/v1/update-user-role` (admin)
///
/// The target's session is rewritten, so the new role applies from their
/// next request without a new login.
pub async fn update_user_role(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Value>> {
    let role = request.role.trim().to_ascii_lowercase();
    if !ROLES.contains(&role.as_str()) {
        return Err(ApiError::bad_request(format!("role must be one of {ROLES:?}")));
    }

    let mut user = load_user(&state, request.id.trim()).await?;
    user.role = role;
    let user = state.users.update_by_id(&user.id.clone(), user).await?;
    let synced = state.auth.sessions.sync(&user).await?;
    tracing::info!(
        admin = %admin.subject_id,
        subject = %user.id,
        role = %user.role,
        session_rewritten = synced,
        "Role updated"
    );
    Ok(Json(json!({ "success": true, "user": user })))
}

/// `GET /api/v1/get-users` (admin)
pub async fn get_users(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let users = state.users.find_all().await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

/// `DELETE /api/v1/delete-user/{id}` (admin)
///
/// Ends the session too, so outstanding access credentials stop working at
/// the gate.
pub async fn delete_user(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = state.users.delete_by_id(&id).await?;
    state.auth.sessions.end(&user.id).await?;
    tracing::info!(subject = %user.id, "Account deleted");
    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    })))
}

async fn load_user(state: &AppState, id: &str) -> ApiResult<User> {
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}
