//! Repository layer.
//!
//! Each repository is a zero-sized struct. Reads take `&PgPool`; writes that
//! participate in a lifecycle commit take `&mut PgConnection` so the caller
//! can run them inside one transaction.

pub mod course_audit_repo;
pub mod course_repo;
pub mod course_version_repo;
pub mod user_repo;

pub use course_audit_repo::CourseAuditRepo;
pub use course_repo::CourseRepo;
pub use course_version_repo::CourseVersionRepo;
pub use user_repo::UserRepo;
