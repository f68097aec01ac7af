//! Course lifecycle states and the static transition graph.
//!
//! ```text
//! DRAFT        ──▶ IN_REVIEW
//! IN_REVIEW    ──▶ PUBLISHED | REJECTED | DRAFT
//! PUBLISHED    ──▶ ARCHIVED | SOFT_DELETED
//! REJECTED     ──▶ DRAFT
//! ARCHIVED     ──▶ PUBLISHED | SOFT_DELETED
//! SOFT_DELETED ──▶ DRAFT (restore)
//! ```
//!
//! There is no DRAFT → PUBLISHED edge: every course passes review.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::capability::Capability;

/// The publication status of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    InReview,
    Published,
    Rejected,
    Archived,
    SoftDeleted,
}

impl CourseStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [CourseStatus; 6] = [
        Self::Draft,
        Self::InReview,
        Self::Published,
        Self::Rejected,
        Self::Archived,
        Self::SoftDeleted,
    ];

    /// Persisted value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InReview => "in_review",
            Self::Published => "published",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
            Self::SoftDeleted => "soft_deleted",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::InReview => "In Review",
            Self::Published => "Published",
            Self::Rejected => "Rejected",
            Self::Archived => "Archived",
            Self::SoftDeleted => "Deleted",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Draft => "Course is being prepared by its author",
            Self::InReview => "Course has been submitted and awaits moderation",
            Self::Published => "Course is live and visible to students",
            Self::Rejected => "Course was rejected during review and needs changes",
            Self::Archived => "Course is no longer offered but kept for reference",
            Self::SoftDeleted => "Course has been removed and can only be restored by an administrator",
        }
    }

    /// Whether the course content may be changed in this status.
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }

    pub fn is_visible_to_students(self) -> bool {
        matches!(self, Self::Published)
    }

    /// Capability a principal needs to move a course *into* this status.
    ///
    /// Edge-specific exceptions are handled by [`capability_for_transition`].
    ///
    /// [`capability_for_transition`]: CourseStatus::capability_for_transition
    pub fn required_capability(self) -> Capability {
        match self {
            Self::Draft | Self::InReview => Capability::Author,
            Self::Published | Self::Rejected | Self::Archived | Self::SoftDeleted => {
                Capability::Administrator
            }
        }
    }

    /// Statuses reachable from this one in a single transition.
    pub fn allowed_transitions(self) -> &'static [CourseStatus] {
        match self {
            Self::Draft => &[Self::InReview],
            Self::InReview => &[Self::Published, Self::Rejected, Self::Draft],
            Self::Published => &[Self::Archived, Self::SoftDeleted],
            Self::Rejected => &[Self::Draft],
            Self::Archived => &[Self::Published, Self::SoftDeleted],
            Self::SoftDeleted => &[Self::Draft],
        }
    }

    pub fn can_transition_to(self, target: CourseStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Capability needed for the edge `self → target`.
    ///
    /// Restoring a soft-deleted course back to DRAFT is administrator-only even
    /// though entering DRAFT normally needs only authorship.
    pub fn capability_for_transition(self, target: CourseStatus) -> Capability {
        match (self, target) {
            (Self::SoftDeleted, Self::Draft) => Capability::Administrator,
            _ => target.required_capability(),
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a persisted status string is not a known [`CourseStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown course status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for CourseStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
