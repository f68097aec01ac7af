//! Persistence seam for courses, their audit trail, and version snapshots.
//!
//! [`CourseStore`] is object safe so the API can hold an
//! `Arc<dyn CourseStore>`. Two implementations exist: `PgCourseStore` in
//! `lectern_db` and [`MemoryCourseStore`](super::memory::MemoryCourseStore).
//!
//! The write methods [`commit_transition`](CourseStore::commit_transition)
//! and [`commit_restore`](CourseStore::commit_restore) are reserved for the
//! lifecycle engine. Each must apply all of its writes atomically.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::course::{Course, CourseContent, Curriculum};
use crate::types::{DbId, Timestamp};

use super::status::CourseStatus;

/// Best-effort request provenance recorded on audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One immutable audit record of a status change (or content restore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: DbId,
    pub course_id: DbId,
    pub actor_id: DbId,
    pub from_status: String,
    pub to_status: String,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

impl AuditEntry {
    /// Materialize a stored entry from its insert payload.
    pub fn from_new(
        id: DbId,
        course_id: DbId,
        entry: NewAuditEntry,
        integrity_hash: String,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            course_id,
            actor_id: entry.actor_id,
            from_status: entry.from_status,
            to_status: entry.to_status,
            reason: entry.reason,
            metadata: entry.metadata,
            ip_address: entry.context.ip_address,
            user_agent: entry.context.user_agent,
            integrity_hash,
            created_at,
        }
    }
}

/// Insert payload for an audit entry. Id, hash, and timestamp are assigned by
/// the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub actor_id: DbId,
    pub from_status: String,
    pub to_status: String,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub context: RequestContext,
}

/// A published snapshot of a course's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseVersion {
    pub id: DbId,
    pub course_id: DbId,
    pub version_number: i32,
    pub content: CourseContent,
    pub curriculum: Curriculum,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// Content captured for a new version. The version number is assigned by the
/// store inside the commit transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionSnapshot {
    pub content: CourseContent,
    pub curriculum: Curriculum,
    pub created_by: DbId,
}

impl VersionSnapshot {
    pub fn capture(course: &Course, created_by: DbId) -> Self {
        Self {
            content: course.content.clone(),
            curriculum: course.curriculum.clone(),
            created_by,
        }
    }
}

/// Everything a single transition writes.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionWrite {
    pub course_id: DbId,
    /// Status the engine validated against; the store must reject the write if
    /// the persisted status differs.
    pub expected_status: String,
    pub new_status: CourseStatus,
    pub snapshot: Option<VersionSnapshot>,
    pub audit: NewAuditEntry,
}

/// What a committed transition produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionReceipt {
    pub audit_entry: AuditEntry,
    pub version: Option<CourseVersion>,
}

/// Everything a restore-from-version writes.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreWrite {
    pub course_id: DbId,
    pub expected_status: String,
    pub content: CourseContent,
    pub curriculum: Curriculum,
    pub audit: NewAuditEntry,
}

/// Store-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("course {0} not found")]
    CourseNotFound(DbId),

    /// The persisted status no longer matches what the caller observed.
    #[error("course {course_id} is no longer in status '{expected}'")]
    StaleStatus { course_id: DbId, expected: String },

    /// Another writer claimed the same version number first.
    #[error("version {version_number} of course {course_id} already exists")]
    VersionConflict { course_id: DbId, version_number: i32 },

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Cheap liveness probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a new course in DRAFT.
    async fn create_course(
        &self,
        author_id: DbId,
        content: &CourseContent,
        curriculum: &Curriculum,
    ) -> Result<Course, StoreError>;

    async fn find_course(&self, id: DbId) -> Result<Option<Course>, StoreError>;

    /// Courses currently in `status`, newest first.
    async fn list_courses_with_status(
        &self,
        status: CourseStatus,
    ) -> Result<Vec<Course>, StoreError>;

    /// Replace content and curriculum if the course is still in
    /// `expected_status`. Returns `None` when the course is missing or its
    /// status moved.
    async fn update_content(
        &self,
        id: DbId,
        expected_status: CourseStatus,
        content: &CourseContent,
        curriculum: &Curriculum,
    ) -> Result<Option<Course>, StoreError>;

    /// Apply a transition atomically: optional version insert, status update,
    /// and audit insert.
    async fn commit_transition(
        &self,
        write: &TransitionWrite,
    ) -> Result<TransitionReceipt, StoreError>;

    /// Apply a content restore atomically: audit insert, then content update.
    async fn commit_restore(&self, write: &RestoreWrite) -> Result<AuditEntry, StoreError>;

    /// Audit entries for a course, newest first.
    async fn history_for(&self, course_id: DbId) -> Result<Vec<AuditEntry>, StoreError>;

    /// Versions of a course, newest first.
    async fn versions_for(&self, course_id: DbId) -> Result<Vec<CourseVersion>, StoreError>;

    async fn find_version(&self, version_id: DbId) -> Result<Option<CourseVersion>, StoreError>;
}
