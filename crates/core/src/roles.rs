//! Well-known role name constants.
//!
//! These must match the values accepted by the `users.role` column
//! (see `20261001000001_create_users.sql`).

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_INSTRUCTOR: &str = "instructor";
pub const ROLE_STUDENT: &str = "student";

/// Whether the role may author courses.
pub fn can_author_courses(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_INSTRUCTOR
}
