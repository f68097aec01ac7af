//! Errors for course operations outside the lifecycle engine.
//!
//! Content CRUD and request-level checks report through [`CoreError`]; the
//! engine has its own taxonomy in [`crate::lifecycle::error`]. The API maps
//! both to HTTP responses.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A course, version, or user id did not resolve.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed course content (blank title, negative price).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The course is not in a state that allows the operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not the course author or an administrator.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
