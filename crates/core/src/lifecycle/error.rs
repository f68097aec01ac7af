use crate::types::DbId;

use super::capability::Capability;
use super::status::CourseStatus;

/// Errors reported by the lifecycle engine.
///
/// Authorization and validation are fully evaluated before any write, so
/// every variant implies that nothing was committed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifecycleError {
    /// The persisted status of the course is not a known value.
    #[error("Course {course_id} has an invalid status '{value}'")]
    InvalidState { course_id: DbId, value: String },

    /// The requested edge is not part of the transition graph.
    #[error("Cannot transition course from {} to {}", from.label(), to.label())]
    IllegalTransition {
        from: CourseStatus,
        to: CourseStatus,
    },

    /// The principal lacks the capability required for the edge.
    #[error("The {required} capability is required to move a course to {}", target.label())]
    Forbidden {
        required: Capability,
        target: CourseStatus,
    },

    /// Content is incomplete for review; carries every violation.
    #[error("Course is not ready for review: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("{0}")]
    InvalidArgument(String),

    /// A concurrent writer won the race and retries were exhausted.
    #[error("{0}")]
    Conflict(String),

    /// The store failed; nothing was committed.
    #[error("Storage error: {0}")]
    Storage(String),
}
