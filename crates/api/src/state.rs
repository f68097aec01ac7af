use std::sync::Arc;

use lectern_core::lifecycle::{CourseStore, TransitionEngine};
use lectern_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Course persistence (PostgreSQL in production, in-memory in tests).
    pub store: Arc<dyn CourseStore>,
    /// The only component allowed to change course status.
    pub engine: Arc<TransitionEngine>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the transition engine to `store`, with `event_bus` as its listener.
    pub fn new(store: Arc<dyn CourseStore>, config: ServerConfig, event_bus: Arc<EventBus>) -> Self {
        let engine = TransitionEngine::new(Arc::clone(&store), config.lifecycle.clone())
            .with_listener(event_bus);
        Self {
            store,
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}
