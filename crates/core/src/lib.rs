//! Lectern domain core.
//!
//! Pure domain types and the course lifecycle engine. Nothing in this crate
//! talks to a database or the network directly: persistence is reached
//! through the [`lifecycle::store::CourseStore`] trait, implemented by
//! `lectern_db` for PostgreSQL and by [`lifecycle::memory`] for tests and
//! local development.

pub mod audit;
pub mod course;
pub mod error;
pub mod hashing;
pub mod lifecycle;
pub mod roles;
pub mod types;
