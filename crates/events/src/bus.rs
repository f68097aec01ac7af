//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the application. It also
//! implements the lifecycle engine's [`TransitionListener`], so every
//! committed course transition is published as a
//! [`event_types::COURSE_STATUS_CHANGED`] event.

use chrono::{DateTime, Utc};
use lectern_core::lifecycle::status::CourseStatus;
use lectern_core::lifecycle::{StatusChange, TransitionListener};
use lectern_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Well-known event type names.
pub mod event_types {
    pub const COURSE_STATUS_CHANGED: &str = "course.status_changed";
}

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// An event published on the bus.
///
/// Course events set `course_id`; `actor_id` is the user whose request caused
/// the event. The typed body lives in `payload` and is decoded by accessors
/// such as [`course_status_changed`](PlatformEvent::course_status_changed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"course.status_changed"`.
    pub event_type: String,
    pub course_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            course_id: None,
            actor_id: None,
            payload,
            occurred_at: Utc::now(),
        }
    }

    pub fn for_course(mut self, course_id: DbId) -> Self {
        self.course_id = Some(course_id);
        self
    }

    pub fn caused_by(mut self, actor_id: DbId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Decode the payload of a [`event_types::COURSE_STATUS_CHANGED`] event.
    ///
    /// Returns `None` for any other event type or a malformed payload.
    pub fn course_status_changed(&self) -> Option<CourseStatusChanged> {
        if self.event_type != event_types::COURSE_STATUS_CHANGED {
            return None;
        }
        serde_json::from_value(self.payload.clone()).ok()
    }
}

/// Payload of a [`event_types::COURSE_STATUS_CHANGED`] event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseStatusChanged {
    pub course_id: DbId,
    pub author_id: DbId,
    pub course_title: String,
    pub from: CourseStatus,
    pub to: CourseStatus,
    pub actor_id: DbId,
    pub reason: Option<String>,
}

impl From<&StatusChange> for CourseStatusChanged {
    fn from(change: &StatusChange) -> Self {
        Self {
            course_id: change.course_id,
            author_id: change.author_id,
            course_title: change.course_title.clone(),
            from: change.from,
            to: change.to,
            actor_id: change.actor_id,
            reason: change.reason.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use lectern_events::bus::{EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let _rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new("course.created", serde_json::json!({ "course_id": 1 })));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed messages are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. With no subscribers the
    /// event is dropped.
    pub fn publish(&self, event: PlatformEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TransitionListener for EventBus {
    fn status_changed(&self, change: &StatusChange) {
        let payload = match serde_json::to_value(CourseStatusChanged::from(change)) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, course_id = change.course_id, "Failed to encode status change");
                return;
            }
        };
        self.publish(
            PlatformEvent::new(event_types::COURSE_STATUS_CHANGED, payload)
                .for_course(change.course_id)
                .caused_by(change.actor_id),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
