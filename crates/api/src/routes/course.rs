//! Route definitions for the `/courses` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{course, lifecycle};
use crate::state::AppState;

/// Routes mounted at `/courses`.
///
/// ```text
/// GET    /                                          -> list_catalog
/// POST   /                                          -> create
/// GET    /transitions                               -> transition_graph
/// GET    /{id}                                      -> get_by_id
/// PUT    /{id}                                      -> update
/// POST   /{id}/submit                               -> submit
/// POST   /{id}/publish                              -> publish
/// POST   /{id}/reject                               -> reject
/// POST   /{id}/archive                              -> archive
/// DELETE /{id}/delete                               -> soft_delete
/// POST   /{id}/restore                              -> restore
/// POST   /{id}/validate                             -> validate
/// GET    /{id}/history                              -> history
/// GET    /{id}/history/verify                       -> verify_history
/// GET    /{id}/versions                             -> versions
/// POST   /{id}/restore-from-version/{version_id}    -> restore_from_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(course::list_catalog).post(course::create))
        .route("/transitions", get(lifecycle::transition_graph))
        .route("/{id}", get(course::get_by_id).put(course::update))
        .route("/{id}/submit", post(lifecycle::submit))
        .route("/{id}/publish", post(lifecycle::publish))
        .route("/{id}/reject", post(lifecycle::reject))
        .route("/{id}/archive", post(lifecycle::archive))
        .route("/{id}/delete", delete(lifecycle::soft_delete))
        .route("/{id}/restore", post(lifecycle::restore))
        .route("/{id}/validate", post(lifecycle::validate))
        .route("/{id}/history", get(lifecycle::history))
        .route("/{id}/history/verify", get(lifecycle::verify_history))
        .route("/{id}/versions", get(lifecycle::versions))
        .route(
            "/{id}/restore-from-version/{version_id}",
            post(lifecycle::restore_from_version),
        )
}
