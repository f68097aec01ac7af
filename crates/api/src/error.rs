use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lectern_core::error::CoreError;
use lectern_core::lifecycle::{LifecycleError, StoreError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error bodies of the
/// form `{ "status": "error", "code": ..., "message": ... }`. Validation
/// failures also carry an `errors` array.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A refusal or failure from the transition engine.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A read through the course store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No route matched the request path.
    #[error("No route for {0}")]
    RouteNotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut errors: Option<Vec<String>> = None;

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },

            // --- Lifecycle engine ---
            AppError::Lifecycle(err) => match err {
                LifecycleError::IllegalTransition { .. } => {
                    (StatusCode::BAD_REQUEST, "ILLEGAL_TRANSITION", err.to_string())
                }
                LifecycleError::ValidationFailed(list) => {
                    errors = Some(list.clone());
                    (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", err.to_string())
                }
                LifecycleError::InvalidArgument(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone())
                }
                LifecycleError::Forbidden { .. } => {
                    (StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string())
                }
                LifecycleError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                LifecycleError::InvalidState { course_id, value } => {
                    tracing::error!(course_id, value = %value, "Course has an invalid status");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INVALID_STATE",
                        err.to_string(),
                    )
                }
                LifecycleError::Storage(msg) => {
                    tracing::error!(error = %msg, "Lifecycle storage error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORAGE_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },

            // --- Store reads ---
            AppError::Store(err) => classify_store_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::RouteNotFound(path) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("No route for {path}"),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let mut body = json!({
            "status": "error",
            "code": code,
            "message": message,
        });
        if let Some(errors) = errors {
            body["errors"] = json!(errors);
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a store error into an HTTP status, error code, and message.
///
/// Backend details are logged and replaced with a generic message.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::CourseNotFound(id) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Course with id {id} not found"),
        ),
        StoreError::StaleStatus { .. } | StoreError::VersionConflict { .. } => {
            (StatusCode::CONFLICT, "CONFLICT", err.to_string())
        }
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "Course store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}
