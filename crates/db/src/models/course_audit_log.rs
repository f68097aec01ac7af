//! Course audit log model and insert DTO.
//!
//! Audit rows are append-only: there is no `updated_at`, and the table
//! rejects UPDATE and DELETE at the trigger level.

use lectern_core::lifecycle::store::AuditEntry;
use lectern_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `course_audit_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseAuditLog {
    pub id: DbId,
    pub course_id: DbId,
    pub actor_id: DbId,
    pub from_status: String,
    pub to_status: String,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

impl From<CourseAuditLog> for AuditEntry {
    fn from(row: CourseAuditLog) -> Self {
        AuditEntry {
            id: row.id,
            course_id: row.course_id,
            actor_id: row.actor_id,
            from_status: row.from_status,
            to_status: row.to_status,
            reason: row.reason,
            metadata: row.metadata,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            integrity_hash: row.integrity_hash,
            created_at: row.created_at,
        }
    }
}

/// Insert DTO. `created_at` is supplied by the caller because it is part of
/// the hashed payload.
#[derive(Debug, Clone)]
pub struct CreateCourseAuditLog<'a> {
    pub course_id: DbId,
    pub actor_id: DbId,
    pub from_status: &'a str,
    pub to_status: &'a str,
    pub reason: Option<&'a str>,
    pub metadata: Option<&'a serde_json::Value>,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub integrity_hash: &'a str,
    pub created_at: Timestamp,
}
