//! Application state shared across all request handlers.

use resnotify_core::processors::ConsumerState;
use resnotify_core::store::NotificationStore;
use std::sync::Arc;
use tokio::sync::watch;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Notification store, shared with the consumer.
    pub store: Arc<dyn NotificationStore>,
    /// Latest state published by the consumer loop.
    pub consumer_state: watch::Receiver<ConsumerState>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        consumer_state: watch::Receiver<ConsumerState>,
    ) -> Self {
        Self {
            store,
            consumer_state,
        }
    }

    /// Current consumer state.
    pub fn consumer_state(&self) -> ConsumerState {
        *self.consumer_state.borrow()
    }
}
