//! Course audit trail helpers: metadata keys and the per-course integrity
//! hash chain.
//!
//! Each audit entry stores `sha256(prev_hash | canonical_entry)`, where
//! `prev_hash` is the hash of the previous entry for the same course (or a
//! fixed seed for the first one). Stores compute the hash inside the same
//! transaction that inserts the entry.

use chrono::SubsecRound;

use crate::hashing;
use crate::lifecycle::store::{AuditEntry, NewAuditEntry};
use crate::types::{DbId, Timestamp};

/// Metadata keys written by the lifecycle engine.
pub mod metadata_keys {
    pub const RESTORED_FROM_VERSION: &str = "restored_from_version";
}

/// Known seed value for the first entry in each course's chain.
const CHAIN_SEED: &str = "COURSE_AUDIT_CHAIN_SEED_V1";

/// Current time truncated to the precision PostgreSQL `TIMESTAMPTZ` keeps,
/// so hashes computed before insert still verify after a round trip.
pub fn audit_timestamp() -> Timestamp {
    chrono::Utc::now().trunc_subsecs(6)
}

/// Canonical string form of an entry's content, used as hash input.
pub fn canonical_entry(
    course_id: DbId,
    actor_id: DbId,
    from_status: &str,
    to_status: &str,
    reason: Option<&str>,
    metadata: Option<&serde_json::Value>,
    created_at: Timestamp,
) -> String {
    let metadata = metadata.map(|m| m.to_string()).unwrap_or_default();
    format!(
        "{course_id}|{actor_id}|{from_status}|{to_status}|{}|{metadata}|{}",
        reason.unwrap_or_default(),
        created_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
    )
}

/// Compute the integrity hash for a new entry.
pub fn seal(
    prev_hash: Option<&str>,
    course_id: DbId,
    entry: &NewAuditEntry,
    created_at: Timestamp,
) -> String {
    let data = canonical_entry(
        course_id,
        entry.actor_id,
        &entry.from_status,
        &entry.to_status,
        entry.reason.as_deref(),
        entry.metadata.as_ref(),
        created_at,
    );
    compute_integrity_hash(prev_hash, &data)
}

/// Compute the SHA-256 integrity hash for an audit log entry.
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    hashing::sha256_hex(combined.as_bytes())
}

/// Result of walking a course's audit chain.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChainVerification {
    pub verified_entries: usize,
    pub chain_valid: bool,
    /// Id of the first entry whose hash does not match, if any.
    pub first_break: Option<DbId>,
}

/// Verify a course's audit chain. `entries` must be ordered oldest-first.
pub fn verify_chain(entries: &[AuditEntry]) -> ChainVerification {
    let mut prev: Option<&str> = None;
    for (index, entry) in entries.iter().enumerate() {
        let data = canonical_entry(
            entry.course_id,
            entry.actor_id,
            &entry.from_status,
            &entry.to_status,
            entry.reason.as_deref(),
            entry.metadata.as_ref(),
            entry.created_at,
        );
        if compute_integrity_hash(prev, &data) != entry.integrity_hash {
            return ChainVerification {
                verified_entries: index,
                chain_valid: false,
                first_break: Some(entry.id),
            };
        }
        prev = Some(&entry.integrity_hash);
    }
    ChainVerification {
        verified_entries: entries.len(),
        chain_valid: true,
        first_break: None,
    }
}
