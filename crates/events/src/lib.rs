//! Lectern event bus and notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. It is registered with the lifecycle engine as
//!   its transition listener.
//! - [`PlatformEvent`]: the canonical domain event envelope.
//! - [`StatusNotifier`]: background task that emails course authors when
//!   their course changes status.
//! - [`delivery`]: external delivery channels (SMTP email).

pub mod bus;
pub mod delivery;
pub mod notifier;

pub use bus::{event_types, CourseStatusChanged, EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError, OutgoingEmail};
pub use notifier::{NotificationOutcome, NotifierSummary, StatusNotifier};
