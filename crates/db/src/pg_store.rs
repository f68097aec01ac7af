//! PostgreSQL implementation of the lifecycle [`CourseStore`].
//!
//! Each commit runs in one transaction: the course row is locked with
//! `SELECT ... FOR UPDATE`, its status compared to what the engine validated
//! against, and only then are the version, status, and audit rows written.
//! Dropping the transaction on any error rolls everything back.

use async_trait::async_trait;
use lectern_core::audit;
use lectern_core::course::{Course, CourseContent, Curriculum};
use lectern_core::lifecycle::status::CourseStatus;
use lectern_core::lifecycle::store::{
    AuditEntry, CourseStore, CourseVersion, NewAuditEntry, RestoreWrite, StoreError,
    TransitionReceipt, TransitionWrite,
};
use lectern_core::types::DbId;
use sqlx::PgConnection;

use crate::models::course_audit_log::CreateCourseAuditLog;
use crate::repositories::course_version_repo::VERSION_NUMBER_CONSTRAINT;
use crate::repositories::{CourseAuditRepo, CourseRepo, CourseVersionRepo};
use crate::DbPool;

/// PostgreSQL-backed course store.
#[derive(Clone)]
pub struct PgCourseStore {
    pool: DbPool,
}

impl PgCourseStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn is_version_number_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(VERSION_NUMBER_CONSTRAINT)
        }
        _ => false,
    }
}

/// Lock the course row and confirm its status has not moved.
async fn lock_expected(
    conn: &mut PgConnection,
    course_id: DbId,
    expected: &str,
) -> Result<(), StoreError> {
    match CourseRepo::lock_status(conn, course_id).await.map_err(backend)? {
        None => Err(StoreError::CourseNotFound(course_id)),
        Some(current) if current != expected => {
            tracing::debug!(course_id, current = %current, expected, "Stale course status");
            Err(StoreError::StaleStatus {
                course_id,
                expected: expected.to_string(),
            })
        }
        Some(_) => Ok(()),
    }
}

/// Chain and insert an audit entry on the open transaction.
async fn append_audit(
    conn: &mut PgConnection,
    course_id: DbId,
    entry: &NewAuditEntry,
) -> Result<AuditEntry, StoreError> {
    let prev_hash = CourseAuditRepo::find_last_hash(&mut *conn, course_id)
        .await
        .map_err(backend)?;
    let created_at = audit::audit_timestamp();
    let integrity_hash = audit::seal(prev_hash.as_deref(), course_id, entry, created_at);

    let row = CourseAuditRepo::insert(
        &mut *conn,
        &CreateCourseAuditLog {
            course_id,
            actor_id: entry.actor_id,
            from_status: &entry.from_status,
            to_status: &entry.to_status,
            reason: entry.reason.as_deref(),
            metadata: entry.metadata.as_ref(),
            ip_address: entry.context.ip_address.as_deref(),
            user_agent: entry.context.user_agent.as_deref(),
            integrity_hash: &integrity_hash,
            created_at,
        },
    )
    .await
    .map_err(backend)?;
    Ok(row.into())
}

#[async_trait]
impl CourseStore for PgCourseStore {
    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(backend)
    }

    async fn create_course(
        &self,
        author_id: DbId,
        content: &CourseContent,
        curriculum: &Curriculum,
    ) -> Result<Course, StoreError> {
        CourseRepo::create(
            &self.pool,
            author_id,
            CourseStatus::Draft.as_str(),
            content,
            curriculum,
        )
        .await
        .map(Course::from)
        .map_err(backend)
    }

    async fn find_course(&self, id: DbId) -> Result<Option<Course>, StoreError> {
        CourseRepo::find_by_id(&self.pool, id)
            .await
            .map(|row| row.map(Course::from))
            .map_err(backend)
    }

    async fn list_courses_with_status(
        &self,
        status: CourseStatus,
    ) -> Result<Vec<Course>, StoreError> {
        CourseRepo::list_by_status(&self.pool, status.as_str())
            .await
            .map(|rows| rows.into_iter().map(Course::from).collect())
            .map_err(backend)
    }

    async fn update_content(
        &self,
        id: DbId,
        expected_status: CourseStatus,
        content: &CourseContent,
        curriculum: &Curriculum,
    ) -> Result<Option<Course>, StoreError> {
        CourseRepo::update_content(&self.pool, id, expected_status.as_str(), content, curriculum)
            .await
            .map(|row| row.map(Course::from))
            .map_err(backend)
    }

    async fn commit_transition(
        &self,
        write: &TransitionWrite,
    ) -> Result<TransitionReceipt, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        lock_expected(&mut tx, write.course_id, &write.expected_status).await?;

        let version = match &write.snapshot {
            Some(snapshot) => {
                let version_number = CourseVersionRepo::next_version_number(&mut tx, write.course_id)
                    .await
                    .map_err(backend)?;
                let row = CourseVersionRepo::insert(
                    &mut tx,
                    write.course_id,
                    version_number,
                    &snapshot.content,
                    &snapshot.curriculum,
                    snapshot.created_by,
                )
                .await
                .map_err(|e| {
                    if is_version_number_violation(&e) {
                        StoreError::VersionConflict {
                            course_id: write.course_id,
                            version_number,
                        }
                    } else {
                        backend(e)
                    }
                })?;
                Some(CourseVersion::from(row))
            }
            None => None,
        };

        let updated = CourseRepo::set_status(&mut tx, write.course_id, write.new_status.as_str())
            .await
            .map_err(backend)?;
        if !updated {
            return Err(StoreError::CourseNotFound(write.course_id));
        }
        let audit_entry = append_audit(&mut tx, write.course_id, &write.audit).await?;

        tx.commit().await.map_err(backend)?;
        Ok(TransitionReceipt {
            audit_entry,
            version,
        })
    }

    async fn commit_restore(&self, write: &RestoreWrite) -> Result<AuditEntry, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        lock_expected(&mut tx, write.course_id, &write.expected_status).await?;

        let audit_entry = append_audit(&mut tx, write.course_id, &write.audit).await?;
        CourseRepo::overwrite_content(
            &mut tx,
            write.course_id,
            None,
            &write.content,
            &write.curriculum,
        )
        .await
        .map_err(backend)?
        .ok_or(StoreError::CourseNotFound(write.course_id))?;

        tx.commit().await.map_err(backend)?;
        Ok(audit_entry)
    }

    async fn history_for(&self, course_id: DbId) -> Result<Vec<AuditEntry>, StoreError> {
        CourseAuditRepo::list_by_course(&self.pool, course_id)
            .await
            .map(|rows| rows.into_iter().map(AuditEntry::from).collect())
            .map_err(backend)
    }

    async fn versions_for(&self, course_id: DbId) -> Result<Vec<CourseVersion>, StoreError> {
        CourseVersionRepo::list_by_course(&self.pool, course_id)
            .await
            .map(|rows| rows.into_iter().map(CourseVersion::from).collect())
            .map_err(backend)
    }

    async fn find_version(&self, version_id: DbId) -> Result<Option<CourseVersion>, StoreError> {
        CourseVersionRepo::find_by_id(&self.pool, version_id)
            .await
            .map(|row| row.map(CourseVersion::from))
            .map_err(backend)
    }
}
