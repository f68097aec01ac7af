//! Capabilities and the acting principal.
//!
//! The HTTP boundary resolves a [`Principal`] once per request (from the
//! authenticated user and the course being acted on) and passes it into the
//! engine explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::course::Course;
use crate::roles::ROLE_ADMIN;
use crate::types::DbId;

/// An authorization grant checked before a course may enter a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Authorship of the course being acted on.
    Author,
    /// Platform moderation rights.
    Administrator,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated actor initiating a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: DbId,
    capabilities: Vec<Capability>,
}

impl Principal {
    pub fn new(user_id: DbId, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        let mut capabilities: Vec<Capability> = capabilities.into_iter().collect();
        capabilities.dedup();
        Self {
            user_id,
            capabilities,
        }
    }

    /// Resolve the capabilities `user_id` holds over `course`.
    pub fn for_course(user_id: DbId, role: &str, course: &Course) -> Self {
        let mut capabilities = Vec::with_capacity(2);
        if course.author_id == user_id {
            capabilities.push(Capability::Author);
        }
        if role == ROLE_ADMIN {
            capabilities.push(Capability::Administrator);
        }
        Self::new(user_id, capabilities)
    }

    /// Whether the principal satisfies `capability`.
    ///
    /// Administrators satisfy author requirements on every course.
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
            || (capability == Capability::Author
                && self.capabilities.contains(&Capability::Administrator))
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }
}
