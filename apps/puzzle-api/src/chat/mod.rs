//! Broadcast chat over WebSocket.
//!
//! A [`ChatHub`] owns the [`ConnectionRegistry`] and the
//! [`BroadcastDispatcher`]. It lives in `AppState` and each connection task
//! gets a [`SessionController`] from it.

pub mod dispatcher;
pub mod identity;
pub mod registry;
pub mod server;
pub mod session;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

pub use dispatcher::{BroadcastDispatcher, DispatchReport};
pub use registry::{ConnectionRegistry, DuplicateSessionError, RegistryStats, SharedSink};
pub use session::{SessionController, SessionEnd};

#[derive(Clone)]
pub struct ChatHub {
    registry: Arc<ConnectionRegistry>,
    dispatcher: BroadcastDispatcher,
}

impl ChatHub {
    pub fn new() -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&registry));
        Self {
            registry,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn controller(&self) -> SessionController {
        SessionController::new(Arc::clone(&self.registry), self.dispatcher.clone())
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new()
    }
}
