//! In-process doubles for the chat transport.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::session::{Frame, FrameSource, TransportError};
use super::sink::{ChatSink, Outbound, SinkError};

/// Sink that records everything pushed into it.
pub(crate) struct RecordingSink {
    items: Mutex<Vec<Outbound>>,
    fail: bool,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A sink whose every send fails, as if the peer went away.
    pub(crate) fn broken() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn items(&self) -> Vec<Outbound> {
        self.items.lock().clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.items
            .lock()
            .iter()
            .filter_map(|item| match item {
                Outbound::Text(text) => Some(text.clone()),
                Outbound::Close { .. } => None,
            })
            .collect()
    }

    pub(crate) fn close_code(&self) -> Option<u16> {
        self.items.lock().iter().find_map(|item| match item {
            Outbound::Close { code, .. } => Some(*code),
            Outbound::Text(_) => None,
        })
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn send_text(&self, text: String) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Closed);
        }
        self.items.lock().push(Outbound::Text(text));
        Ok(())
    }

    async fn close(&self, code: u16, reason: &str) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Closed);
        }
        self.items.lock().push(Outbound::Close {
            code,
            reason: reason.to_string(),
        });
        Ok(())
    }
}

/// Frame source fed through a channel. Once every feeder is dropped the
/// source reports a peer close.
pub(crate) struct ScriptedFrames {
    rx: mpsc::UnboundedReceiver<Result<Frame, TransportError>>,
}

pub(crate) type FrameFeeder = mpsc::UnboundedSender<Result<Frame, TransportError>>;

impl ScriptedFrames {
    pub(crate) fn channel() -> (FrameFeeder, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// A source that yields `frames` in order, then a peer close.
    pub(crate) fn from_script(frames: Vec<Result<Frame, TransportError>>) -> Self {
        let (tx, source) = Self::channel();
        for frame in frames {
            let _ = tx.send(frame);
        }
        source
    }
}

#[async_trait]
impl FrameSource for ScriptedFrames {
    async fn next_frame(&mut self) -> Result<Frame, TransportError> {
        self.rx.recv().await.unwrap_or(Ok(Frame::Close))
    }
}
