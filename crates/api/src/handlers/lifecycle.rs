//! Handlers for course lifecycle operations.
//!
//! Every status change goes through [`TransitionEngine`]; these handlers only
//! load the course, resolve the acting [`Principal`] and apply the boundary
//! checks that depend on who is calling (owner-only submit, admin-only
//! moderation).
//!
//! [`TransitionEngine`]: lectern_core::lifecycle::TransitionEngine
//! [`Principal`]: lectern_core::lifecycle::Principal

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use lectern_core::audit::{verify_chain, ChainVerification};
use lectern_core::course::Course;
use lectern_core::error::CoreError;
use lectern_core::lifecycle::store::{AuditEntry, CourseVersion};
use lectern_core::lifecycle::validation::validate_for_review;
use lectern_core::lifecycle::{
    Capability, CourseStatus, LifecycleError, RestoreOutcome, TransitionOutcome,
    TransitionRequest,
};
use lectern_core::types::DbId;
use serde::{Deserialize, Serialize};

use super::load_course;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client_meta::ClientMeta;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Optional body accepted by every transition endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct TransitionBody {
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl TransitionBody {
    /// Parse a possibly empty request body.
    ///
    /// Clients often send no body (or no content type) for a bare transition,
    /// so an empty payload means "no reason, no metadata".
    fn parse(body: &Bytes) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
    }

    fn into_request(self, target: CourseStatus, meta: ClientMeta) -> TransitionRequest {
        let mut request = TransitionRequest::to(target).with_context(meta.into_context());
        if let Some(reason) = self.reason {
            request = request.with_reason(reason);
        }
        if let Some(metadata) = self.metadata {
            request = request.with_metadata(metadata);
        }
        request
    }
}

/// Result of running the review gate without transitioning.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub course_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct ChainReport {
    pub course_id: DbId,
    #[serde(flatten)]
    pub verification: ChainVerification,
}

/// Per-status metadata for the public transition graph.
#[derive(Debug, Serialize)]
pub struct StatusInfo {
    pub status: CourseStatus,
    pub label: &'static str,
    pub description: &'static str,
    pub editable: bool,
    pub visible_to_students: bool,
    pub required_capability: Capability,
    pub allowed_transitions: &'static [CourseStatus],
}

impl From<CourseStatus> for StatusInfo {
    fn from(status: CourseStatus) -> Self {
        Self {
            status,
            label: status.label(),
            description: status.description(),
            editable: status.is_editable(),
            visible_to_students: status.is_visible_to_students(),
            required_capability: status.required_capability(),
            allowed_transitions: status.allowed_transitions(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

async fn apply(
    state: &AppState,
    mut course: Course,
    user: &AuthUser,
    request: TransitionRequest,
) -> AppResult<Json<TransitionOutcome>> {
    let principal = user.principal_for(&course);
    let outcome = state
        .engine
        .transition(&mut course, &principal, request)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/courses/{id}/submit
///
/// Only the course author may submit; administrators moderate but do not
/// submit on an author's behalf.
pub async fn submit(
    user: AuthUser,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<Json<TransitionOutcome>> {
    let body = TransitionBody::parse(&body)?;
    let course = load_course(&state, id).await?;
    if !user.owns(&course) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the course author can submit it for review".into(),
        )));
    }
    let request = body.into_request(CourseStatus::InReview, meta);
    apply(&state, course, &user, request).await
}

/// POST /api/courses/{id}/publish
pub async fn publish(
    RequireAdmin(admin): RequireAdmin,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<Json<TransitionOutcome>> {
    let body = TransitionBody::parse(&body)?;
    let course = load_course(&state, id).await?;
    let request = body.into_request(CourseStatus::Published, meta);
    apply(&state, course, &admin, request).await
}

/// POST /api/courses/{id}/reject
///
/// A non-blank `reason` is required so the author knows what to fix.
pub async fn reject(
    RequireAdmin(admin): RequireAdmin,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<Json<TransitionOutcome>> {
    let body = TransitionBody::parse(&body)?;
    if body.reason.as_deref().map_or(true, |r| r.trim().is_empty()) {
        return Err(LifecycleError::InvalidArgument(
            "A reason is required to reject a course".into(),
        )
        .into());
    }
    let course = load_course(&state, id).await?;
    let request = body.into_request(CourseStatus::Rejected, meta);
    apply(&state, course, &admin, request).await
}

/// POST /api/courses/{id}/archive
pub async fn archive(
    RequireAdmin(admin): RequireAdmin,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<Json<TransitionOutcome>> {
    let body = TransitionBody::parse(&body)?;
    let course = load_course(&state, id).await?;
    let request = body.into_request(CourseStatus::Archived, meta);
    apply(&state, course, &admin, request).await
}

/// DELETE /api/courses/{id}/delete
///
/// Soft delete. The row is kept and can be restored by an administrator.
pub async fn soft_delete(
    RequireAdmin(admin): RequireAdmin,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<Json<TransitionOutcome>> {
    let body = TransitionBody::parse(&body)?;
    let course = load_course(&state, id).await?;
    let request = body.into_request(CourseStatus::SoftDeleted, meta);
    apply(&state, course, &admin, request).await
}

/// POST /api/courses/{id}/restore
pub async fn restore(
    RequireAdmin(admin): RequireAdmin,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<Json<TransitionOutcome>> {
    let body = TransitionBody::parse(&body)?;
    let course = load_course(&state, id).await?;
    let request = body.into_request(CourseStatus::Draft, meta);
    apply(&state, course, &admin, request).await
}

/// POST /api/courses/{id}/restore-from-version/{version_id}
///
/// Overwrite content and curriculum from a published snapshot. Status is
/// left unchanged.
pub async fn restore_from_version(
    RequireAdmin(admin): RequireAdmin,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<RestoreOutcome>> {
    let mut course = load_course(&state, id).await?;
    let version = state
        .store
        .find_version(version_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CourseVersion",
            id: version_id,
        }))?;

    let principal = admin.principal_for(&course);
    let outcome = state
        .engine
        .restore_from_version(&mut course, &version, &principal, meta.into_context())
        .await?;
    Ok(Json(outcome))
}

// ---------------------------------------------------------------------------
// Read-only views
// ---------------------------------------------------------------------------

/// POST /api/courses/{id}/validate
///
/// Run the review gate and report every problem. Never changes state.
pub async fn validate(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ValidationReport>> {
    let course = load_course(&state, id).await?;
    user.ensure_owner_or_admin(&course)?;

    let errors = validate_for_review(&course.content, &course.curriculum);
    Ok(Json(ValidationReport {
        valid: errors.is_empty(),
        errors,
        course_id: course.id,
    }))
}

/// GET /api/courses/{id}/history
///
/// Audit entries, newest first.
pub async fn history(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<AuditEntry>>>> {
    let course = load_course(&state, id).await?;
    user.ensure_owner_or_admin(&course)?;

    let entries = state.store.history_for(course.id).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/courses/{id}/history/verify
pub async fn verify_history(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ChainReport>>> {
    let course = load_course(&state, id).await?;

    let mut entries = state.store.history_for(course.id).await?;
    entries.reverse();
    let verification = verify_chain(&entries);
    if !verification.chain_valid {
        tracing::warn!(
            course_id = course.id,
            first_break = ?verification.first_break,
            "Audit chain verification failed"
        );
    }

    Ok(Json(DataResponse {
        data: ChainReport {
            course_id: course.id,
            verification,
        },
    }))
}

/// GET /api/courses/{id}/versions
///
/// Published snapshots, newest first.
pub async fn versions(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<CourseVersion>>>> {
    let course = load_course(&state, id).await?;
    user.ensure_owner_or_admin(&course)?;

    let versions = state.store.versions_for(course.id).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /api/courses/transitions
///
/// Static dump of the status graph. Public.
pub async fn transition_graph() -> Json<DataResponse<Vec<StatusInfo>>> {
    Json(DataResponse {
        data: CourseStatus::ALL.into_iter().map(StatusInfo::from).collect(),
    })
}
