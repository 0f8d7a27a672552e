//! HTTP routes.
//!
//! | Route | Access |
//! |-------|--------|
//! | `POST /registration`, `POST /login`, `POST /social-auth` | public |
//! | `GET\|POST /refresh` | refresh credential |
//! | `GET\|POST /logout`, `GET /me` | authenticated |
//! | `PUT /update-user-info`, `PUT /update-user-password` | authenticated |
//! | `PUT /update-user-role`, `GET /get-users`, `DELETE /delete-user/{id}` | admin |
//! | `GET /get-course/{id}`, `GET /get-courses`, `GET /get-layout` | public |
//! | `POST /enroll-course` (alias `POST /create-order`) | authenticated |
//! | `GET /get-course-content/{id}`, `PUT /add-question`, `PUT /add-answer` | enrolled or admin |
//! | `PUT /add-review/{id}` | enrolled |
//! | `POST /create-course`, `PUT /edit-course/{id}`, `DELETE /delete-course/{id}` | admin |
//! | `GET /get-all-courses`, `PUT /add-reply` | admin |
//! | `GET /get-orders`, `GET /get-{users,courses,orders}-analytics` | admin |
//! | `POST /create-layout`, `PUT /edit-layout` | admin |
//! | `GET /get-all-notifications`, `PUT /update-notification/{id}` | admin |
//!
//! All of the above live under `/api/v1`.

pub mod analytics;
pub mod courses;
pub mod health;
pub mod layout;
pub mod notifications;
pub mod orders;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use learnhub_auth::http::{
    login_handler, logout_handler, me_handler, refresh_handler, social_login_handler,
};

use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Accounts and sessions
        .route("/registration", post(users::register))
        .route("/login", post(login_handler))
        .route("/social-auth", post(social_login_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
        .route("/refresh", get(refresh_handler).post(refresh_handler))
        .route("/me", get(me_handler))
        .route("/update-user-info", put(users::update_user_info))
        .route("/update-user-password", put(users::update_user_password))
        .route("/update-user-role", put(users::update_user_role))
        .route("/get-users", get(users::get_users))
        .route("/delete-user/{id}", delete(users::delete_user))
        // Catalog
        .route("/create-course", post(courses::create_course))
        .route("/edit-course/{id}", put(courses::edit_course))
        .route("/delete-course/{id}", delete(courses::delete_course))
        .route("/get-course/{id}", get(courses::get_course))
        .route("/get-courses", get(courses::get_courses))
        .route("/get-all-courses", get(courses::get_all_courses))
        .route("/get-course-content/{id}", get(courses::get_course_content))
        .route("/add-question", put(courses::add_question))
        .route("/add-answer", put(courses::add_answer))
        .route("/add-review/{id}", put(courses::add_review))
        .route("/add-reply", put(courses::add_review_reply))
        // Orders
        .route("/enroll-course", post(orders::enroll_course))
        .route("/create-order", post(orders::enroll_course))
        .route("/get-orders", get(orders::get_orders))
        // Analytics
        .route("/get-users-analytics", get(analytics::users_analytics))
        .route("/get-courses-analytics", get(analytics::courses_analytics))
        .route("/get-orders-analytics", get(analytics::orders_analytics))
        // Layout
        .route("/create-layout", post(layout::create_layout))
        .route("/edit-layout", put(layout::edit_layout))
        .route("/get-layout", get(layout::get_layout))
        // Notifications
        .route("/get-all-notifications", get(notifications::get_notifications))
        .route("/update-notification/{id}", put(notifications::update_notification))
}
