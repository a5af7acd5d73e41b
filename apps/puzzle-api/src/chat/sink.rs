//! Outbound half of a chat connection.
//!
//! The lifecycle controller and the dispatcher never touch the socket. They
//! push [`Outbound`] items into a [`ChatSink`], and the connection's writer
//! task drains them onto the wire.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::SendTimeoutError, error::TrySendError};

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Policy violation, used when a session id is already active.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// How long a close request may wait for room in a full queue.
const CLOSE_ENQUEUE_TIMEOUT: Duration = Duration::from_secs(2);

/// One item queued for the writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("connection is closed")]
    Closed,
    #[error("outbound queue is full")]
    Full,
}

/// Handle that delivers text to one connection and can close it.
///
/// `send_text` must not wait on the peer: a slow reader fails its own
/// delivery instead of holding up the broadcast.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_text(&self, text: String) -> Result<(), SinkError>;
    async fn close(&self, code: u16, reason: &str) -> Result<(), SinkError>;
}

/// Sink backed by a bounded queue drained by the connection's writer task.
pub struct ChannelSink {
    tx: mpsc::Sender<Outbound>,
}

impl ChannelSink {
    /// Create a sink and the receiver its writer task should drain.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ChatSink for ChannelSink {
    async fn send_text(&self, text: String) -> Result<(), SinkError> {
        self.tx
            .try_send(Outbound::Text(text))
            .map_err(|err| match err {
                TrySendError::Full(_) => SinkError::Full,
                TrySendError::Closed(_) => SinkError::Closed,
            })
    }

    async fn close(&self, code: u16, reason: &str) -> Result<(), SinkError> {
        let item = Outbound::Close {
            code,
            reason: reason.to_string(),
        };
        self.tx
            .send_timeout(item, CLOSE_ENQUEUE_TIMEOUT)
            .await
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => SinkError::Full,
                SendTimeoutError::Closed(_) => SinkError::Closed,
            })
    }
}
