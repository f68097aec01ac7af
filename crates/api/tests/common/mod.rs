//! Shared helpers for API integration tests.
//!
//! The app is built on `MemoryCourseStore`, so these tests need no database.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use lectern_api::auth::jwt::{issue_token, JwtConfig};
use lectern_api::config::ServerConfig;
use lectern_api::router::build_app_router;
use lectern_api::state::AppState;
use lectern_core::course::{Chapter, Course, CourseContent, Curriculum, Lesson};
use lectern_core::lifecycle::memory::MemoryCourseStore;
use lectern_core::lifecycle::{CourseStatus, LifecycleConfig};
use lectern_core::roles::{ROLE_ADMIN, ROLE_INSTRUCTOR, ROLE_STUDENT};
use lectern_core::types::DbId;
use lectern_events::EventBus;
use tower::ServiceExt;

pub const ADMIN_ID: DbId = 1;
pub const AUTHOR_ID: DbId = 7;
pub const OTHER_INSTRUCTOR_ID: DbId = 42;
pub const STUDENT_ID: DbId = 99;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            leeway_secs: 0,
            token_ttl_mins: 15,
        },
        lifecycle: LifecycleConfig::default(),
    }
}

/// A running test application plus handles on its internals.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryCourseStore>,
    pub event_bus: Arc<EventBus>,
    config: ServerConfig,
}

impl TestApp {
    /// A fresh router clone; `oneshot` consumes it.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn token(&self, user_id: DbId, role: &str) -> String {
        issue_token(user_id, role, &self.config.jwt).unwrap()
    }

    pub fn admin_token(&self) -> String {
        self.token(ADMIN_ID, ROLE_ADMIN)
    }

    pub fn author_token(&self) -> String {
        self.token(AUTHOR_ID, ROLE_INSTRUCTOR)
    }

    pub fn other_instructor_token(&self) -> String {
        self.token(OTHER_INSTRUCTOR_ID, ROLE_INSTRUCTOR)
    }

    pub fn student_token(&self) -> String {
        self.token(STUDENT_ID, ROLE_STUDENT)
    }

    /// Insert a course owned by [`AUTHOR_ID`] directly into the store.
    pub async fn seed(&self, content: CourseContent, status: CourseStatus) -> Course {
        let now = chrono::Utc::now();
        self.store
            .seed_course(Course {
                id: 0,
                author_id: AUTHOR_ID,
                content,
                curriculum: three_lessons(),
                status: status.as_str().to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
    }
}

/// Build the full application router over an in-memory store.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryCourseStore::new());
    let event_bus = Arc::new(EventBus::default());
    let state = AppState::new(store.clone(), config.clone(), Arc::clone(&event_bus));
    TestApp {
        router: build_app_router(state, &config),
        store,
        event_bus,
        config,
    }
}

pub fn complete_content() -> CourseContent {
    CourseContent {
        title: "Rust for Backend Engineers".to_string(),
        short_description: Some("Build reliable services with Rust".to_string()),
        description: Some("A long-form description.".to_string()),
        requirements: vec!["Basic programming".to_string()],
        learning_outcomes: vec!["Write async services".to_string()],
        target_audience: vec!["Backend developers".to_string()],
        category: Some("programming".to_string()),
        level: Some("intermediate".to_string()),
        price_cents: Some(4900),
        duration_hours: Some(6.5),
        thumbnail_url: Some("https://cdn.example.com/rust.png".to_string()),
        video_url: None,
    }
}

pub fn three_lessons() -> Curriculum {
    let lesson = |title: &str| Lesson {
        title: title.to_string(),
        duration_minutes: Some(20),
        video_url: None,
    };
    Curriculum {
        chapters: vec![Chapter {
            title: "Getting started".to_string(),
            lessons: vec![lesson("Ownership"), lesson("Traits"), lesson("Async")],
        }],
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_empty(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
