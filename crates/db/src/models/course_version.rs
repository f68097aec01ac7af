//! Course version (published snapshot) model.

use lectern_core::course::{CourseContent, Curriculum};
use lectern_core::lifecycle::store::CourseVersion;
use lectern_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `course_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseVersionRow {
    pub id: DbId,
    pub course_id: DbId,
    pub version_number: i32,
    pub content: Json<CourseContent>,
    pub curriculum: Json<Curriculum>,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

impl From<CourseVersionRow> for CourseVersion {
    fn from(row: CourseVersionRow) -> Self {
        CourseVersion {
            id: row.id,
            course_id: row.course_id,
            version_number: row.version_number,
            content: row.content.0,
            curriculum: row.curriculum.0,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}
