//! Repository for the `course_versions` table.

use lectern_core::course::{CourseContent, Curriculum};
use lectern_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::course_version::CourseVersionRow;

const COLUMNS: &str = "id, course_id, version_number, content, curriculum, created_by, created_at";

/// Name of the unique constraint on `(course_id, version_number)`.
pub const VERSION_NUMBER_CONSTRAINT: &str = "uq_course_versions_course_version";

/// Insert and query operations for published course snapshots.
pub struct CourseVersionRepo;

impl CourseVersionRepo {
    /// Next version number for a course (max existing + 1, or 1 if none).
    pub async fn next_version_number(
        conn: &mut PgConnection,
        course_id: DbId,
    ) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version_number), 0) + 1 \
             FROM course_versions WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    /// Insert a snapshot under an explicit version number.
    ///
    /// Fails with a unique violation on [`VERSION_NUMBER_CONSTRAINT`] if the
    /// number was taken by a concurrent writer.
    pub async fn insert(
        conn: &mut PgConnection,
        course_id: DbId,
        version_number: i32,
        content: &CourseContent,
        curriculum: &Curriculum,
        created_by: DbId,
    ) -> Result<CourseVersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO course_versions
                (course_id, version_number, content, curriculum, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CourseVersionRow>(&query)
            .bind(course_id)
            .bind(version_number)
            .bind(Json(content))
            .bind(Json(curriculum))
            .bind(created_by)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CourseVersionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM course_versions WHERE id = $1");
        sqlx::query_as::<_, CourseVersionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Versions of a course, ordered by version number descending.
    pub async fn list_by_course(
        pool: &PgPool,
        course_id: DbId,
    ) -> Result<Vec<CourseVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM course_versions \
             WHERE course_id = $1 ORDER BY version_number DESC"
        );
        sqlx::query_as::<_, CourseVersionRow>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }
}
