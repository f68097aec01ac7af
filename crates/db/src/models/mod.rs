//! Row models and DTOs, one module per table.

pub mod course;
pub mod course_audit_log;
pub mod course_version;
pub mod user;
