//! Repository for the append-only `course_audit_logs` table.

use lectern_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::course_audit_log::{CourseAuditLog, CreateCourseAuditLog};

const COLUMNS: &str = "id, course_id, actor_id, from_status, to_status, reason, \
    metadata, ip_address, user_agent, integrity_hash, created_at";

/// Insert and query operations for course audit entries. There is no update
/// or delete.
pub struct CourseAuditRepo;

impl CourseAuditRepo {
    pub async fn insert(
        conn: &mut PgConnection,
        input: &CreateCourseAuditLog<'_>,
    ) -> Result<CourseAuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO course_audit_logs
                (course_id, actor_id, from_status, to_status, reason, metadata,
                 ip_address, user_agent, integrity_hash, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CourseAuditLog>(&query)
            .bind(input.course_id)
            .bind(input.actor_id)
            .bind(input.from_status)
            .bind(input.to_status)
            .bind(input.reason)
            .bind(input.metadata)
            .bind(input.ip_address)
            .bind(input.user_agent)
            .bind(input.integrity_hash)
            .bind(input.created_at)
            .fetch_one(conn)
            .await
    }

    /// Integrity hash of the course's most recent entry.
    pub async fn find_last_hash(
        conn: &mut PgConnection,
        course_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT integrity_hash FROM course_audit_logs \
             WHERE course_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(course_id)
        .fetch_optional(conn)
        .await
    }

    /// Entries for a course, newest first.
    pub async fn list_by_course(
        pool: &PgPool,
        course_id: DbId,
    ) -> Result<Vec<CourseAuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM course_audit_logs \
             WHERE course_id = $1 ORDER BY id DESC"
        );
        sqlx::query_as::<_, CourseAuditLog>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }
}
