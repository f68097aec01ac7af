//! Course aggregate: content fields, curriculum tree, and persisted status.
//!
//! The `status` field holds the raw persisted value. It is only ever written
//! by the lifecycle engine ([`crate::lifecycle::engine`]); everything else
//! treats it as read-only.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Author-editable content of a course.
///
/// Also the payload of a version snapshot, so restoring a version is a plain
/// replacement of this struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseContent {
    pub title: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    #[serde(default)]
    pub target_audience: Vec<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    /// Price in the smallest currency unit.
    pub price_cents: Option<i64>,
    pub duration_hours: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
}

/// A single lesson inside a chapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,
    pub duration_minutes: Option<i32>,
    pub video_url: Option<String>,
}

/// An ordered group of lessons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// The chapter/lesson tree of a course. Order is significant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Curriculum {
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Number of lessons across all chapters.
    pub fn total_lessons(&self) -> usize {
        self.chapters.iter().map(|c| c.lessons.len()).sum()
    }
}

/// The course aggregate root, owned by its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: DbId,
    pub author_id: DbId,
    #[serde(flatten)]
    pub content: CourseContent,
    pub curriculum: Curriculum,
    /// Raw persisted status value; see [`crate::lifecycle::status::CourseStatus`].
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
