//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use lectern_core::course::Course;
use lectern_core::error::CoreError;
use lectern_core::lifecycle::Principal;
use lectern_core::roles::ROLE_ADMIN;
use lectern_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// Role name (e.g. `"admin"`, `"instructor"`).
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn owns(&self, course: &Course) -> bool {
        course.author_id == self.user_id
    }

    /// Resolve this user's lifecycle capabilities over `course`.
    pub fn principal_for(&self, course: &Course) -> Principal {
        Principal::for_course(self.user_id, &self.role, course)
    }

    /// Reject unless the user authored `course` or is an administrator.
    pub fn ensure_owner_or_admin(&self, course: &Course) -> Result<(), AppError> {
        if self.owns(course) || self.is_admin() {
            return Ok(());
        }
        Err(AppError::Core(CoreError::Forbidden(
            "Only the course author or an administrator can do this".into(),
        )))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
