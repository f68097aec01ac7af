//! Primitive aliases shared by every crate.

/// Primary key of courses, users, audit entries, and versions (`BIGSERIAL`).
pub type DbId = i64;

/// UTC timestamp used on rows and audit entries.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
