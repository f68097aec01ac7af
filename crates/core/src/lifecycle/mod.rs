//! Course lifecycle: status graph, capabilities, the review gate, and the
//! transition engine that ties them to persistence.

pub mod capability;
pub mod engine;
pub mod error;
pub mod memory;
pub mod status;
pub mod store;
pub mod validation;

pub use capability::{Capability, Principal};
pub use engine::{
    LifecycleConfig, RestoreOutcome, StatusChange, TransitionEngine, TransitionListener,
    TransitionOutcome, TransitionRequest,
};
pub use error::LifecycleError;
pub use status::CourseStatus;
pub use store::{CourseStore, RequestContext, StoreError};
