//! Course routes.
//!
//! Public reads go through the catalog cache and only ever return the course
//! outline. Section content is read from the document store for enrolled
//! users. Every write goes through `CourseService`, which commits first and
//! then invalidates `course:<id>` and `allCourses`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use learnhub_auth::{AdminOnly, Authenticated, IdentityContext};
use learnhub_catalog::{Author, CourseInput};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::notification::Notification;
use crate::state::AppState;

/// `POST /api/v1/create-course` (admin)
pub async fn create_course(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(input): Json<CourseInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let course = state.courses.create(input).await?;
    tracing::info!(subject = %admin.subject_id, course_id = %course.id, "Course uploaded");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "course": course })),
    ))
}

/// `PUT /api/v1/edit-course/{id}` (admin)
pub async fn edit_course(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CourseInput>,
) -> ApiResult<Json<Value>> {
    let course = state.courses.update(&id, input).await?;
    Ok(Json(json!({ "success": true, "course": course })))
}

/// `DELETE /api/v1/delete-course/{id}` (admin)
pub async fn delete_course(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.courses.delete(&id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Course deleted successfully",
    })))
}

/// `GET /api/v1/get-course/{id}`
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let course = state.courses.get(&id).await?;
    Ok(Json(json!({ "success": true, "course": course })))
}

/// `GET /api/v1/get-courses`
pub async fn get_courses(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let courses = state.courses.list().await?;
    Ok(Json(json!({ "success": true, "courses": courses })))
}

/// `GET /api/v1/get-all-courses` (admin)
///
/// Full documents, newest first, straight from the document store.
pub async fn get_all_courses(
    AdminOnly(_): AdminOnly,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let courses = state.courses.list_full().await?;
    Ok(Json(json!({ "success": true, "courses": courses })))
}

/// `GET /api/v1/get-course-content/{id}`
///
/// Enrollment is checked against the session snapshot, so a purchase is
/// visible here as soon as the session was rewritten.
pub async fn get_course_content(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_enrolled(&identity, &id)?;
    let content = state.courses.content(&id).await?;
    Ok(Json(json!({ "success": true, "content": content })))
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub content_id: String,
}

/// `PUT /api/v1/add-question` (enrolled)
pub async fn add_question(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> ApiResult<Json<Value>> {
    require_enrolled(&identity, &request.course_id)?;
    let course = state
        .courses
        .add_question(
            &request.course_id,
            &request.content_id,
            author_of(&identity),
            &request.question,
        )
        .await?;

    let section = course
        .content
        .iter()
        .find(|s| s.id == request.content_id)
        .map_or("", |s| s.title.as_str());
    state
        .notify(
            Notification::new(
                "New Question Received",
                format!("You have a new question in {section}"),
                state.clock.now(),
            )
            .about(identity.subject_id.clone()),
        )
        .await;

    Ok(Json(json!({ "success": true, "course": course })))
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub content_id: String,
    #[serde(default)]
    pub question_id: String,
}

/// `PUT /api/v1/add-answer` (enrolled)
///
/// Someone else answering notifies the question's author.
pub async fn add_answer(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> ApiResult<Json<Value>> {
    require_enrolled(&identity, &request.course_id)?;
    let (course, question) = state
        .courses
        .add_answer(
            &request.course_id,
            &request.content_id,
            &request.question_id,
            author_of(&identity),
            &request.answer,
        )
        .await?;

    if question.author.id != identity.subject_id {
        state
            .notify(
                Notification::new(
                    "New Question Reply",
                    format!("{} answered your question", identity.snapshot.name),
                    state.clock.now(),
                )
                .about(question.author.id.clone()),
            )
            .await;
    }

    Ok(Json(json!({ "success": true, "course": course })))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub rating: u8,
}

/// `PUT /api/v1/add-review/{id}` (purchasers only)
pub async fn add_review(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> ApiResult<Json<Value>> {
    if !identity.owns_course(&id) {
        return Err(ApiError::NotEnrolled);
    }
    let course = state
        .courses
        .add_review(&id, author_of(&identity), request.rating, &request.review)
        .await?;

    state
        .notify(
            Notification::new(
                "New Review Received",
                format!("{} has given a review in {}", identity.snapshot.name, course.name),
                state.clock.now(),
            )
            .about(identity.subject_id.clone()),
        )
        .await;

    Ok(Json(json!({ "success": true, "course": course.public_view() })))
}

#[derive(Debug, Deserialize)]
pub struct ReviewReplyRequest {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub review_id: String,
}

/// `PUT /api/v1/add-reply` (admin)
pub async fn add_review_reply(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<ReviewReplyRequest>,
) -> ApiResult<Json<Value>> {
    let course = state
        .courses
        .add_review_reply(
            &request.course_id,
            &request.review_id,
            author_of(&admin),
            &request.comment,
        )
        .await?;
    Ok(Json(json!({ "success": true, "course": course.public_view() })))
}

fn require_enrolled(identity: &IdentityContext, course_id: &str) -> ApiResult<()> {
    if identity.owns_course(course_id) || identity.is_admin() {
        Ok(())
    } else {
        Err(ApiError::NotEnrolled)
    }
}

fn author_of(identity: &IdentityContext) -> Author {
    Author {
        id: identity.subject_id.clone(),
        name: identity.snapshot.name.clone(),
        avatar: identity.snapshot.avatar.clone(),
    }
}
