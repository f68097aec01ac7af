//! Course entity model and DTOs.

use lectern_core::course::{Course, CourseContent, Curriculum};
use lectern_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `courses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseRow {
    pub id: DbId,
    pub author_id: DbId,
    pub title: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub requirements: Vec<String>,
    pub learning_outcomes: Vec<String>,
    pub target_audience: Vec<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_hours: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub curriculum: Json<Curriculum>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: row.id,
            author_id: row.author_id,
            content: CourseContent {
                title: row.title,
                short_description: row.short_description,
                description: row.description,
                requirements: row.requirements,
                learning_outcomes: row.learning_outcomes,
                target_audience: row.target_audience,
                category: row.category,
                level: row.level,
                price_cents: row.price_cents,
                duration_hours: row.duration_hours,
                thumbnail_url: row.thumbnail_url,
                video_url: row.video_url,
            },
            curriculum: row.curriculum.0,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
