//! The transition engine: the single authorized mutator of course status.
//!
//! A transition is evaluated in full (status parse, graph edge, capability,
//! content gate) before anything is written. The writes themselves (version
//! snapshot, status, audit entry) go to the store as one atomic commit.
//! Listeners are notified only after that commit succeeds.

use std::sync::Arc;

use serde::Serialize;

use crate::audit::metadata_keys;
use crate::course::Course;
use crate::types::DbId;

use super::capability::{Capability, Principal};
use super::error::LifecycleError;
use super::status::CourseStatus;
use super::store::{
    CourseStore, CourseVersion, NewAuditEntry, RequestContext, RestoreWrite, StoreError,
    TransitionReceipt, TransitionWrite, VersionSnapshot,
};
use super::validation::validate_for_review;

/// Default number of times a version-number race is retried.
pub const DEFAULT_MAX_VERSION_RETRIES: u32 = 3;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// How many times a commit is retried after losing a version-number race.
    pub max_version_retries: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_version_retries: DEFAULT_MAX_VERSION_RETRIES,
        }
    }
}

/// A committed status change, handed to listeners after commit.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub course_id: DbId,
    pub author_id: DbId,
    pub course_title: String,
    pub from: CourseStatus,
    pub to: CourseStatus,
    pub actor_id: DbId,
    pub reason: Option<String>,
}

/// Receives status changes after they are committed.
///
/// Implementations must not block; the engine does not wait for downstream
/// work and nothing a listener does can undo the transition.
pub trait TransitionListener: Send + Sync {
    fn status_changed(&self, change: &StatusChange);
}

/// A requested transition.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub target: CourseStatus,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub context: RequestContext,
}

impl TransitionRequest {
    pub fn to(target: CourseStatus) -> Self {
        Self {
            target,
            reason: None,
            metadata: None,
            context: RequestContext::default(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}

/// Summary returned for a successful transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionOutcome {
    pub status: &'static str,
    pub message: String,
    pub course_id: DbId,
    pub old_status: CourseStatus,
    pub new_status: CourseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_number: Option<i32>,
}

/// Summary returned for a successful restore-from-version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreOutcome {
    pub status: &'static str,
    pub message: String,
    pub course_id: DbId,
    pub restored_from_version: i32,
}

/// Course lifecycle state machine.
pub struct TransitionEngine {
    store: Arc<dyn CourseStore>,
    listeners: Vec<Arc<dyn TransitionListener>>,
    config: LifecycleConfig,
}

impl TransitionEngine {
    pub fn new(store: Arc<dyn CourseStore>, config: LifecycleConfig) -> Self {
        Self {
            store,
            listeners: Vec::new(),
            config,
        }
    }

    /// Register a listener notified after every committed transition.
    pub fn with_listener(mut self, listener: Arc<dyn TransitionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Move `course` to `request.target`.
    ///
    /// On success `course.status` is updated in place. On any error the course
    /// and the store are left untouched.
    pub async fn transition(
        &self,
        course: &mut Course,
        principal: &Principal,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, LifecycleError> {
        let from = parse_status(course)?;
        let target = request.target;

        if !from.can_transition_to(target) {
            return Err(LifecycleError::IllegalTransition { from, to: target });
        }

        let required = from.capability_for_transition(target);
        if !principal.has(required) {
            tracing::warn!(
                course_id = course.id,
                user_id = principal.user_id,
                from = %from,
                to = %target,
                required = %required,
                "Transition refused: missing capability"
            );
            return Err(LifecycleError::Forbidden { required, target });
        }

        if target == CourseStatus::InReview {
            let errors = validate_for_review(&course.content, &course.curriculum);
            if !errors.is_empty() {
                return Err(LifecycleError::ValidationFailed(errors));
            }
        }

        // Captured from the pre-transition course so the snapshot reflects
        // exactly what was reviewed.
        let snapshot = (target == CourseStatus::Published && from != CourseStatus::Published)
            .then(|| VersionSnapshot::capture(course, principal.user_id));

        let write = TransitionWrite {
            course_id: course.id,
            expected_status: course.status.clone(),
            new_status: target,
            snapshot,
            audit: NewAuditEntry {
                actor_id: principal.user_id,
                from_status: from.as_str().to_string(),
                to_status: target.as_str().to_string(),
                reason: request.reason.clone(),
                metadata: request.metadata,
                context: request.context,
            },
        };

        let receipt = self.commit_with_retries(&write).await?;
        course.status = target.as_str().to_string();

        let version_number = receipt.version.as_ref().map(|v| v.version_number);
        tracing::info!(
            course_id = course.id,
            user_id = principal.user_id,
            from = %from,
            to = %target,
            version_number = ?version_number,
            audit_entry_id = receipt.audit_entry.id,
            "Course status changed"
        );

        self.notify(&StatusChange {
            course_id: course.id,
            author_id: course.author_id,
            course_title: course.content.title.clone(),
            from,
            to: target,
            actor_id: principal.user_id,
            reason: request.reason,
        });

        Ok(TransitionOutcome {
            status: "success",
            message: format!("Course moved from {} to {}", from.label(), target.label()),
            course_id: course.id,
            old_status: from,
            new_status: target,
            version_number,
        })
    }

    /// Overwrite the course's content from `version`, leaving status alone.
    ///
    /// Writes exactly one audit entry whose from/to both equal the current
    /// status.
    pub async fn restore_from_version(
        &self,
        course: &mut Course,
        version: &CourseVersion,
        principal: &Principal,
        context: RequestContext,
    ) -> Result<RestoreOutcome, LifecycleError> {
        let current = parse_status(course)?;
        if !principal.has(Capability::Administrator) {
            return Err(LifecycleError::Forbidden {
                required: Capability::Administrator,
                target: current,
            });
        }

        if version.course_id != course.id {
            return Err(LifecycleError::InvalidArgument(format!(
                "Version {} does not belong to course {}",
                version.id, course.id
            )));
        }

        let write = RestoreWrite {
            course_id: course.id,
            expected_status: course.status.clone(),
            content: version.content.clone(),
            curriculum: version.curriculum.clone(),
            audit: NewAuditEntry {
                actor_id: principal.user_id,
                from_status: current.as_str().to_string(),
                to_status: current.as_str().to_string(),
                reason: Some(format!(
                    "Restored content from version {}",
                    version.version_number
                )),
                metadata: Some(serde_json::json!({
                    metadata_keys::RESTORED_FROM_VERSION: version.version_number,
                })),
                context,
            },
        };

        let audit_entry = self
            .store
            .commit_restore(&write)
            .await
            .map_err(|e| map_store_error(course.id, e))?;

        course.content = write.content;
        course.curriculum = write.curriculum;

        tracing::info!(
            course_id = course.id,
            user_id = principal.user_id,
            version_number = version.version_number,
            audit_entry_id = audit_entry.id,
            "Course content restored from version"
        );

        Ok(RestoreOutcome {
            status: "success",
            message: format!(
                "Course content restored from version {}",
                version.version_number
            ),
            course_id: course.id,
            restored_from_version: version.version_number,
        })
    }

    async fn commit_with_retries(
        &self,
        write: &TransitionWrite,
    ) -> Result<TransitionReceipt, LifecycleError> {
        let mut attempt = 0;
        loop {
            match self.store.commit_transition(write).await {
                Ok(receipt) => return Ok(receipt),
                Err(StoreError::VersionConflict {
                    course_id,
                    version_number,
                }) if attempt < self.config.max_version_retries => {
                    attempt += 1;
                    tracing::warn!(
                        course_id,
                        version_number,
                        attempt,
                        "Version number taken by a concurrent publish, retrying"
                    );
                }
                Err(e) => return Err(map_store_error(write.course_id, e)),
            }
        }
    }

    fn notify(&self, change: &StatusChange) {
        for listener in &self.listeners {
            listener.status_changed(change);
        }
    }
}

fn parse_status(course: &Course) -> Result<CourseStatus, LifecycleError> {
    course
        .status
        .parse()
        .map_err(|_| LifecycleError::InvalidState {
            course_id: course.id,
            value: course.status.clone(),
        })
}

fn map_store_error(course_id: DbId, err: StoreError) -> LifecycleError {
    match err {
        StoreError::StaleStatus { .. } => LifecycleError::Conflict(format!(
            "Course {course_id} was changed by another request; reload and try again"
        )),
        StoreError::VersionConflict { .. } => LifecycleError::Conflict(format!(
            "Could not allocate a version number for course {course_id}; retries exhausted"
        )),
        StoreError::CourseNotFound(_) | StoreError::Backend(_) => {
            tracing::error!(course_id, error = %err, "Lifecycle commit failed");
            LifecycleError::Storage(err.to_string())
        }
    }
}
