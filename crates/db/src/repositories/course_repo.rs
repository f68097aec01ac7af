//! Repository for the `courses` table.

use lectern_core::course::{CourseContent, Curriculum};
use lectern_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::course::CourseRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, author_id, title, short_description, description, \
    requirements, learning_outcomes, target_audience, category, level, \
    price_cents, duration_hours, thumbnail_url, video_url, curriculum, \
    status, created_at, updated_at";

/// Provides CRUD operations for courses.
///
/// Status is only written through [`CourseRepo::set_status`], which the
/// PostgreSQL course store calls inside a lifecycle commit.
pub struct CourseRepo;

impl CourseRepo {
    /// Insert a new course in `status`.
    pub async fn create(
        pool: &PgPool,
        author_id: DbId,
        status: &str,
        content: &CourseContent,
        curriculum: &Curriculum,
    ) -> Result<CourseRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO courses
                (author_id, title, short_description, description, requirements,
                 learning_outcomes, target_audience, category, level, price_cents,
                 duration_hours, thumbnail_url, video_url, curriculum, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CourseRow>(&query)
            .bind(author_id)
            .bind(&content.title)
            .bind(&content.short_description)
            .bind(&content.description)
            .bind(&content.requirements)
            .bind(&content.learning_outcomes)
            .bind(&content.target_audience)
            .bind(&content.category)
            .bind(&content.level)
            .bind(content.price_cents)
            .bind(content.duration_hours)
            .bind(&content.thumbnail_url)
            .bind(&content.video_url)
            .bind(Json(curriculum))
            .bind(status)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CourseRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, CourseRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List courses in `status`, newest first.
    pub async fn list_by_status(pool: &PgPool, status: &str) -> Result<Vec<CourseRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM courses WHERE status = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, CourseRow>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Replace content and curriculum while the course is still in
    /// `expected_status`.
    ///
    /// Returns `None` if the course does not exist or its status has moved.
    pub async fn update_content(
        pool: &PgPool,
        id: DbId,
        expected_status: &str,
        content: &CourseContent,
        curriculum: &Curriculum,
    ) -> Result<Option<CourseRow>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::overwrite_content(&mut *conn, id, Some(expected_status), content, curriculum).await
    }

    /// Lock the course row for the rest of the transaction and return its
    /// current status.
    pub async fn lock_status(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT status FROM courses WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE courses SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite content fields, optionally guarded by the current status.
    pub async fn overwrite_content(
        conn: &mut PgConnection,
        id: DbId,
        expected_status: Option<&str>,
        content: &CourseContent,
        curriculum: &Curriculum,
    ) -> Result<Option<CourseRow>, sqlx::Error> {
        let query = format!(
            "UPDATE courses SET
                title = $3,
                short_description = $4,
                description = $5,
                requirements = $6,
                learning_outcomes = $7,
                target_audience = $8,
                category = $9,
                level = $10,
                price_cents = $11,
                duration_hours = $12,
                thumbnail_url = $13,
                video_url = $14,
                curriculum = $15,
                updated_at = NOW()
             WHERE id = $1 AND ($2::TEXT IS NULL OR status = $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CourseRow>(&query)
            .bind(id)
            .bind(expected_status)
            .bind(&content.title)
            .bind(&content.short_description)
            .bind(&content.description)
            .bind(&content.requirements)
            .bind(&content.learning_outcomes)
            .bind(&content.target_audience)
            .bind(&content.category)
            .bind(&content.level)
            .bind(content.price_cents)
            .bind(content.duration_hours)
            .bind(&content.thumbnail_url)
            .bind(&content.video_url)
            .bind(Json(curriculum))
            .fetch_optional(conn)
            .await
    }
}
