//! Tests for `AppError` to HTTP response mapping.

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use lectern_api::error::AppError;
use lectern_core::error::CoreError;
use lectern_core::lifecycle::{Capability, CourseStatus, LifecycleError, StoreError};

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ---------------------------------------------------------------------------
// Lifecycle errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn illegal_transition_is_400() {
    let (status, json) = render(
        LifecycleError::IllegalTransition {
            from: CourseStatus::Draft,
            to: CourseStatus::Published,
        }
        .into(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "ILLEGAL_TRANSITION");
    assert_eq!(
        json["message"],
        "Cannot transition course from Draft to Published"
    );
    assert!(json.get("errors").is_none());
}

#[tokio::test]
async fn validation_failed_carries_every_error() {
    let (status, json) = render(
        LifecycleError::ValidationFailed(vec![
            "Title is required".to_string(),
            "Category is required".to_string(),
        ])
        .into(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_FAILED");
    assert_eq!(
        json["errors"],
        serde_json::json!(["Title is required", "Category is required"])
    );
}

#[tokio::test]
async fn forbidden_is_403() {
    let (status, json) = render(
        LifecycleError::Forbidden {
            required: Capability::Administrator,
            target: CourseStatus::Published,
        }
        .into(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn conflict_is_409() {
    let (status, json) = render(LifecycleError::Conflict("lost the race".into()).into()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "lost the race");
}

#[tokio::test]
async fn storage_error_is_sanitized() {
    let (status, json) = render(
        LifecycleError::Storage("connection refused: 10.0.0.5:5432".into()).into(),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "STORAGE_ERROR");
    assert!(!json["message"].as_str().unwrap().contains("10.0.0.5"));
}

#[tokio::test]
async fn invalid_state_is_500() {
    let (status, json) = render(
        LifecycleError::InvalidState {
            course_id: 3,
            value: "pending".into(),
        }
        .into(),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INVALID_STATE");
}

// ---------------------------------------------------------------------------
// Store and core errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_errors_map_by_kind() {
    let (status, _) = render(StoreError::CourseNotFound(9).into()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = render(
        StoreError::StaleStatus {
            course_id: 9,
            expected: "draft".into(),
        }
        .into(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = render(StoreError::Backend("pool timed out".into()).into()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "An internal error occurred");
}

#[tokio::test]
async fn core_not_found_names_the_entity() {
    let (status, json) = render(
        CoreError::NotFound {
            entity: "Course",
            id: 12,
        }
        .into(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Course with id 12 not found");
}

#[test]
fn from_conversions_pick_the_right_variant() {
    assert_matches!(
        AppError::from(LifecycleError::InvalidArgument("x".into())),
        AppError::Lifecycle(LifecycleError::InvalidArgument(_))
    );
    assert_matches!(
        AppError::from(StoreError::Backend("x".into())),
        AppError::Store(StoreError::Backend(_))
    );
}
