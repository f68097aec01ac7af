//! Content completeness gate for leaving DRAFT.
//!
//! Pure logic with no side effects. Every rule is evaluated independently so
//! the caller can report all problems at once.

use crate::course::{CourseContent, Curriculum};

pub const MIN_TITLE_CHARS: usize = 5;
pub const MIN_SHORT_DESCRIPTION_CHARS: usize = 20;
pub const MIN_LESSONS: usize = 3;
pub const MIN_CHAPTERS: usize = 1;
pub const MIN_DURATION_HOURS: f64 = 0.5;

/// Check whether a course is complete enough to be submitted for review.
///
/// Returns human-readable messages in a fixed rule order; an empty vector
/// means the course passes.
pub fn validate_for_review(content: &CourseContent, curriculum: &Curriculum) -> Vec<String> {
    let mut errors = Vec::new();

    let title_chars = content.title.trim().chars().count();
    if title_chars == 0 {
        errors.push("Title is required".to_string());
    } else if title_chars < MIN_TITLE_CHARS {
        errors.push(format!(
            "Title must be at least {MIN_TITLE_CHARS} characters"
        ));
    }

    match non_blank(content.short_description.as_deref()) {
        None => errors.push("Short description is required".to_string()),
        Some(text) if text.chars().count() < MIN_SHORT_DESCRIPTION_CHARS => {
            errors.push(format!(
                "Short description must be at least {MIN_SHORT_DESCRIPTION_CHARS} characters"
            ));
        }
        Some(_) => {}
    }

    if non_blank(content.category.as_deref()).is_none() {
        errors.push("Category must be selected".to_string());
    }

    if non_blank(content.level.as_deref()).is_none() {
        errors.push("Level must be selected".to_string());
    }

    match content.price_cents {
        None => errors.push("Price is required".to_string()),
        Some(price) if price < 0 => errors.push("Price cannot be negative".to_string()),
        Some(_) => {}
    }

    if is_empty_list(&content.requirements) {
        errors.push("Requirements must not be empty".to_string());
    }
    if is_empty_list(&content.learning_outcomes) {
        errors.push("Learning outcomes must not be empty".to_string());
    }
    if is_empty_list(&content.target_audience) {
        errors.push("Target audience must not be empty".to_string());
    }

    if non_blank(content.thumbnail_url.as_deref()).is_none() {
        errors.push("Thumbnail image is required".to_string());
    }

    let lessons = curriculum.total_lessons();
    if lessons < MIN_LESSONS {
        errors.push(format!(
            "Course must have at least {MIN_LESSONS} lessons (currently {lessons})"
        ));
    }

    if curriculum.chapter_count() < MIN_CHAPTERS {
        errors.push(format!(
            "Course must have at least {MIN_CHAPTERS} chapter"
        ));
    }

    match content.duration_hours {
        None => errors.push("Duration is required".to_string()),
        Some(hours) if hours.is_nan() || hours < MIN_DURATION_HOURS => errors.push(format!(
            "Duration must be at least {MIN_DURATION_HOURS} hours"
        )),
        Some(_) => {}
    }

    errors
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_empty_list(items: &[String]) -> bool {
    items.iter().all(|item| item.trim().is_empty())
}
