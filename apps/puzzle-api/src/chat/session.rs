//! Per-connection lifecycle: join, relay frames, leave.

use std::sync::Arc;

use async_trait::async_trait;

use super::dispatcher::{is_bye, BroadcastDispatcher};
use super::registry::{ConnectionRegistry, SharedSink};
use super::sink::{CLOSE_NORMAL, CLOSE_POLICY_VIOLATION};

/// Close reason sent after the "bye" command.
pub const BYE_REASON: &str = "Client said BYE";
/// Close reason sent when a session id is already connected.
pub const DUPLICATE_REASON: &str = "Session already active";

/// One inbound unit from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

#[derive(Debug, thiserror::Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Inbound half of a connection.
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next frame. A finished stream reports [`Frame::Close`].
    async fn next_frame(&mut self) -> Result<Frame, TransportError>;
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    PeerClosed,
    SaidBye,
    TransportFailed,
    /// The id was already active; the connection never joined.
    Rejected,
}

/// Removes the session from the registry when dropped, so every exit path
/// (including task cancellation) leaves exactly once.
struct Membership {
    registry: Arc<ConnectionRegistry>,
    session_id: String,
}

impl Drop for Membership {
    fn drop(&mut self) {
        self.registry.leave(&self.session_id);
        tracing::debug!(session_id = %self.session_id, "chat session left");
    }
}

/// Drives one connection from join to leave.
#[derive(Clone)]
pub struct SessionController {
    registry: Arc<ConnectionRegistry>,
    dispatcher: BroadcastDispatcher,
}

impl SessionController {
    pub fn new(registry: Arc<ConnectionRegistry>, dispatcher: BroadcastDispatcher) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    pub async fn run<F: FrameSource>(
        &self,
        session_id: &str,
        mut frames: F,
        sink: SharedSink,
    ) -> SessionEnd {
        if let Err(err) = self.registry.join(session_id.to_string(), Arc::clone(&sink)) {
            tracing::info!(session_id = %session_id, error = %err, "rejecting chat connection");
            let _ = sink.close(CLOSE_POLICY_VIOLATION, DUPLICATE_REASON).await;
            return SessionEnd::Rejected;
        }

        let _membership = Membership {
            registry: Arc::clone(&self.registry),
            session_id: session_id.to_string(),
        };
        tracing::debug!(session_id = %session_id, "chat session joined");

        loop {
            match frames.next_frame().await {
                Ok(Frame::Text(text)) => {
                    self.dispatcher.dispatch(session_id, &text).await;
                    if is_bye(&text) {
                        if let Err(err) = sink.close(CLOSE_NORMAL, BYE_REASON).await {
                            tracing::debug!(session_id = %session_id, error = %err, "close after bye failed");
                        }
                        return SessionEnd::SaidBye;
                    }
                }
                Ok(Frame::Binary(_)) => continue,
                Ok(Frame::Close) => return SessionEnd::PeerClosed,
                Err(err) => {
                    tracing::debug!(session_id = %session_id, error = %err, "chat transport failed");
                    return SessionEnd::TransportFailed;
                }
            }
        }
    }
}
