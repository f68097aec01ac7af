//! In-process [`CourseStore`] backed by a tokio mutex.
//!
//! Mirrors the PostgreSQL store's semantics (optimistic status check,
//! contiguous version numbers, per-course audit hash chain, all-or-nothing
//! commits) and adds fault injection hooks for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::audit;
use crate::course::{Course, CourseContent, Curriculum};
use crate::types::DbId;

use super::status::CourseStatus;
use super::store::{
    AuditEntry, CourseStore, CourseVersion, NewAuditEntry, RestoreWrite, StoreError,
    TransitionReceipt, TransitionWrite,
};

#[derive(Default)]
struct MemoryState {
    courses: BTreeMap<DbId, Course>,
    audit_entries: Vec<AuditEntry>,
    versions: Vec<CourseVersion>,
    next_course_id: DbId,
    next_audit_id: DbId,
    next_version_id: DbId,
}

impl MemoryState {
    fn next_id(counter: &mut DbId) -> DbId {
        *counter += 1;
        *counter
    }

    fn last_hash(&self, course_id: DbId) -> Option<String> {
        self.audit_entries
            .iter()
            .rev()
            .find(|e| e.course_id == course_id)
            .map(|e| e.integrity_hash.clone())
    }

    fn next_version_number(&self, course_id: DbId) -> i32 {
        self.versions
            .iter()
            .filter(|v| v.course_id == course_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn check_status(&self, course_id: DbId, expected: &str) -> Result<(), StoreError> {
        let course = self
            .courses
            .get(&course_id)
            .ok_or(StoreError::CourseNotFound(course_id))?;
        if course.status != expected {
            return Err(StoreError::StaleStatus {
                course_id,
                expected: expected.to_string(),
            });
        }
        Ok(())
    }

    fn build_audit(&mut self, course_id: DbId, entry: &NewAuditEntry) -> AuditEntry {
        let created_at = audit::audit_timestamp();
        let prev = self.last_hash(course_id);
        let hash = audit::seal(prev.as_deref(), course_id, entry, created_at);
        let id = Self::next_id(&mut self.next_audit_id);
        AuditEntry::from_new(id, course_id, entry.clone(), hash, created_at)
    }
}

/// In-memory course store.
#[derive(Default)]
pub struct MemoryCourseStore {
    state: Mutex<MemoryState>,
    pending_version_conflicts: AtomicU32,
    fail_next_commit: AtomicBool,
}

impl MemoryCourseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a course verbatim, keeping its status (even an unknown one).
    /// The id is reassigned.
    pub async fn seed_course(&self, mut course: Course) -> Course {
        let mut state = self.state.lock().await;
        course.id = MemoryState::next_id(&mut state.next_course_id);
        state.courses.insert(course.id, course.clone());
        course
    }

    /// Make the next `count` version inserts fail as if another writer had
    /// claimed the number first.
    pub fn inject_version_conflicts(&self, count: u32) {
        self.pending_version_conflicts.store(count, Ordering::SeqCst);
    }

    /// Make the next commit fail with a backend error after all checks pass.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    fn take_injected_conflict(&self) -> bool {
        self.pending_version_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn take_injected_failure(&self) -> Result<(), StoreError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_course(
        &self,
        author_id: DbId,
        content: &CourseContent,
        curriculum: &Curriculum,
    ) -> Result<Course, StoreError> {
        let mut state = self.state.lock().await;
        let now = chrono::Utc::now();
        let course = Course {
            id: MemoryState::next_id(&mut state.next_course_id),
            author_id,
            content: content.clone(),
            curriculum: curriculum.clone(),
            status: CourseStatus::Draft.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        state.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn find_course(&self, id: DbId) -> Result<Option<Course>, StoreError> {
        Ok(self.state.lock().await.courses.get(&id).cloned())
    }

    async fn list_courses_with_status(
        &self,
        status: CourseStatus,
    ) -> Result<Vec<Course>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .courses
            .values()
            .rev()
            .filter(|c| c.status == status.as_str())
            .cloned()
            .collect())
    }

    async fn update_content(
        &self,
        id: DbId,
        expected_status: CourseStatus,
        content: &CourseContent,
        curriculum: &Curriculum,
    ) -> Result<Option<Course>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(course) = state.courses.get_mut(&id) else {
            return Ok(None);
        };
        if course.status != expected_status.as_str() {
            return Ok(None);
        }
        course.content = content.clone();
        course.curriculum = curriculum.clone();
        course.updated_at = chrono::Utc::now();
        Ok(Some(course.clone()))
    }

    async fn commit_transition(
        &self,
        write: &TransitionWrite,
    ) -> Result<TransitionReceipt, StoreError> {
        let mut state = self.state.lock().await;
        state.check_status(write.course_id, &write.expected_status)?;

        // Build every row first; nothing is applied until all steps succeed.
        let version = match &write.snapshot {
            Some(snapshot) => {
                let version_number = state.next_version_number(write.course_id);
                if self.take_injected_conflict() {
                    return Err(StoreError::VersionConflict {
                        course_id: write.course_id,
                        version_number,
                    });
                }
                Some(CourseVersion {
                    id: MemoryState::next_id(&mut state.next_version_id),
                    course_id: write.course_id,
                    version_number,
                    content: snapshot.content.clone(),
                    curriculum: snapshot.curriculum.clone(),
                    created_by: snapshot.created_by,
                    created_at: chrono::Utc::now(),
                })
            }
            None => None,
        };
        self.take_injected_failure()?;
        let audit_entry = state.build_audit(write.course_id, &write.audit);

        if let Some(course) = state.courses.get_mut(&write.course_id) {
            course.status = write.new_status.as_str().to_string();
            course.updated_at = chrono::Utc::now();
        }
        if let Some(version) = &version {
            state.versions.push(version.clone());
        }
        state.audit_entries.push(audit_entry.clone());

        Ok(TransitionReceipt {
            audit_entry,
            version,
        })
    }

    async fn commit_restore(&self, write: &RestoreWrite) -> Result<AuditEntry, StoreError> {
        let mut state = self.state.lock().await;
        state.check_status(write.course_id, &write.expected_status)?;
        self.take_injected_failure()?;

        let audit_entry = state.build_audit(write.course_id, &write.audit);
        state.audit_entries.push(audit_entry.clone());
        if let Some(course) = state.courses.get_mut(&write.course_id) {
            course.content = write.content.clone();
            course.curriculum = write.curriculum.clone();
            course.updated_at = chrono::Utc::now();
        }
        Ok(audit_entry)
    }

    async fn history_for(&self, course_id: DbId) -> Result<Vec<AuditEntry>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .audit_entries
            .iter()
            .rev()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn versions_for(&self, course_id: DbId) -> Result<Vec<CourseVersion>, StoreError> {
        let state = self.state.lock().await;
        let mut versions: Vec<_> = state
            .versions
            .iter()
            .filter(|v| v.course_id == course_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions)
    }

    async fn find_version(&self, version_id: DbId) -> Result<Option<CourseVersion>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.versions.iter().find(|v| v.id == version_id).cloned())
    }
}
