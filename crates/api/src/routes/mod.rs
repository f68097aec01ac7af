pub mod course;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /courses                                              catalog (GET), create (POST)
/// /courses/transitions                                  status graph (GET, public)
/// /courses/{id}                                         get, update
/// /courses/{id}/submit                                  -> in_review (POST, author)
/// /courses/{id}/publish                                 -> published (POST, admin)
/// /courses/{id}/reject                                  -> rejected (POST, admin)
/// /courses/{id}/archive                                 -> archived (POST, admin)
/// /courses/{id}/delete                                  -> soft_deleted (DELETE, admin)
/// /courses/{id}/restore                                 -> draft (POST, admin)
/// /courses/{id}/validate                                review gate dry run (POST)
/// /courses/{id}/history                                 audit entries (GET)
/// /courses/{id}/history/verify                          audit chain check (GET, admin)
/// /courses/{id}/versions                                published snapshots (GET)
/// /courses/{id}/restore-from-version/{version_id}       restore content (POST, admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/courses", course::router())
}
