//! Request extractors for authentication, authorization, and provenance.
//!
//! - [`auth::AuthUser`]: the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`]: requires the `admin` role.
//! - [`rbac::RequireInstructor`]: requires `instructor` or `admin`.
//! - [`client_meta::ClientMeta`]: best-effort client IP and user agent.

pub mod auth;
pub mod client_meta;
pub mod rbac;
