//! Handlers for course content.
//!
//! Status is read-only here. Content may only change while the course is in
//! an editable status, and the write is conditional on the status observed
//! so a concurrent transition cannot be overwritten.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use lectern_core::course::{Course, CourseContent, Curriculum};
use lectern_core::error::CoreError;
use lectern_core::lifecycle::{CourseStatus, LifecycleError};
use lectern_core::types::DbId;
use serde::Deserialize;

use super::load_course;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireInstructor;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for creating or updating a course.
#[derive(Debug, Deserialize)]
pub struct CourseRequest {
    #[serde(flatten)]
    pub content: CourseContent,
    #[serde(default)]
    pub curriculum: Curriculum,
}

impl CourseRequest {
    fn validate(&self) -> AppResult<()> {
        if self.content.title.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "Title must not be empty".into(),
            )));
        }
        if self.content.price_cents.is_some_and(|p| p < 0) {
            return Err(AppError::Core(CoreError::Validation(
                "Price must not be negative".into(),
            )));
        }
        Ok(())
    }
}

/// POST /api/courses
///
/// Create a course in DRAFT owned by the caller.
pub async fn create(
    RequireInstructor(user): RequireInstructor,
    State(state): State<AppState>,
    Json(input): Json<CourseRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Course>>)> {
    input.validate()?;
    let course = state
        .store
        .create_course(user.user_id, &input.content, &input.curriculum)
        .await?;
    tracing::info!(course_id = course.id, author_id = user.user_id, "Course created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: course })))
}

/// GET /api/courses
///
/// Public catalog: published courses, newest first.
pub async fn list_catalog(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Course>>>> {
    let courses = state
        .store
        .list_courses_with_status(CourseStatus::Published)
        .await?;
    Ok(Json(DataResponse { data: courses }))
}

/// GET /api/courses/{id}
///
/// Published courses are readable by any authenticated user; everything
/// else only by the author or an administrator.
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Course>>> {
    let course = load_course(&state, id).await?;
    let visible = course
        .status
        .parse::<CourseStatus>()
        .is_ok_and(CourseStatus::is_visible_to_students);
    if !visible {
        user.ensure_owner_or_admin(&course)?;
    }
    Ok(Json(DataResponse { data: course }))
}

/// PUT /api/courses/{id}
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CourseRequest>,
) -> AppResult<Json<DataResponse<Course>>> {
    input.validate()?;
    let course = load_course(&state, id).await?;
    user.ensure_owner_or_admin(&course)?;

    let status = course
        .status
        .parse::<CourseStatus>()
        .map_err(|e| LifecycleError::InvalidState {
            course_id: course.id,
            value: e.0,
        })?;
    if !status.is_editable() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Course content cannot be edited while {}",
            status.label()
        ))));
    }

    let updated = state
        .store
        .update_content(course.id, status, &input.content, &input.curriculum)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Course status changed while it was being edited".into(),
            ))
        })?;
    Ok(Json(DataResponse { data: updated }))
}
