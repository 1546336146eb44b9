//! Shared application state for axum handlers.

use std::sync::Arc;

use pharos_app::ports::EventPublisher;
use pharos_app::services::CommandDispatcher;
use pharos_domain::time::{Timestamp, now};

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the publisher type does not need to be
/// `Clone`; only the `Arc` wrapper is cloned.
pub struct AppState<P> {
    /// The one simulated device.
    pub dispatcher: Arc<CommandDispatcher<P>>,
    /// When the server started, for `/health` uptime.
    pub started_at: Timestamp,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            started_at: self.started_at,
        }
    }
}

impl<P> AppState<P>
where
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a new application state, taking ownership of the dispatcher.
    pub fn new(dispatcher: CommandDispatcher<P>) -> Self {
        Self::from_arc(Arc::new(dispatcher))
    }

    /// Create a new application state from a dispatcher that is already
    /// shared with background tasks.
    pub fn from_arc(dispatcher: Arc<CommandDispatcher<P>>) -> Self {
        Self {
            dispatcher,
            started_at: now(),
        }
    }
}
