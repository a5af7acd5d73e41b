//! WebSocket upgrade handler and per-connection writer task.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::AppState;

use super::identity;
use super::registry::SharedSink;
use super::session::{Frame, FrameSource, TransportError};
use super::sink::{ChannelSink, Outbound};
use super::ChatHub;

/// Keep-alive ping interval.
const PING_INTERVAL: Duration = Duration::from_secs(60);

/// Outbound messages buffered per connection. Broadcasts to a full queue are dropped.
const OUTBOUND_QUEUE: usize = 64;

/// A peer that accepts no data for this long is disconnected.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the writer may take to flush after the session ends.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", get(ws_upgrade))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let identity = identity::resolve(&headers);
    let session_id = identity.id.clone();
    let hub = state.chat.clone();

    let mut response = ws.on_upgrade(move |socket| handle_connection(socket, hub, session_id));

    if identity.fresh {
        match HeaderValue::from_str(&identity::set_cookie_value(&identity.id)) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(?e, "could not encode chat session cookie"),
        }
    }

    response
}

async fn handle_connection(socket: WebSocket, hub: ChatHub, session_id: String) {
    let (ws_tx, ws_rx) = socket.split();
    let (sink, outbound_rx) = ChannelSink::channel(OUTBOUND_QUEUE);
    let mut writer = tokio::spawn(run_writer(ws_tx, outbound_rx, session_id.clone()));

    tracing::info!(session_id = %session_id, "chat connection opened");

    let sink: SharedSink = Arc::new(sink);
    let controller = hub.controller();
    let mut session = Box::pin(controller.run(&session_id, WsFrames { inner: ws_rx }, sink));

    // A writer that gives up on the peer ends the session; dropping the
    // controller future leaves the registry.
    let (end, writer_done) = tokio::select! {
        end = &mut session => (Some(end), false),
        _ = &mut writer => (None, true),
    };
    drop(session);

    let stats = hub.registry().stats();
    tracing::info!(
        session_id = %session_id,
        ?end,
        active = stats.active,
        "chat connection closed"
    );

    if writer_done {
        return;
    }

    // The writer exits once every sink handle is gone; bound the wait.
    if time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        tracing::debug!(session_id = %session_id, "chat writer did not drain in time");
        writer.abort();
    }
}

/// Owns the write half: drains the outbound queue and sends keep-alive pings.
async fn run_writer(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Outbound>,
    session_id: String,
) {
    let mut ping = time::interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);

    loop {
        tokio::select! {
            next = outbound.recv() => {
                match next {
                    Some(Outbound::Text(text)) => {
                        match time::timeout(WRITE_TIMEOUT, ws_tx.send(Message::Text(text.into()))).await {
                            Ok(Ok(())) => {}
                            Ok(Err(_)) => break,
                            Err(_) => {
                                tracing::info!(session_id = %session_id, "chat peer stopped reading");
                                break;
                            }
                        }
                    }
                    Some(Outbound::Close { code, reason }) => {
                        let _ = time::timeout(WRITE_TIMEOUT, send_close(&mut ws_tx, code, &reason)).await;
                        break;
                    }
                    None => {
                        let _ = time::timeout(WRITE_TIMEOUT, ws_tx.close()).await;
                        break;
                    }
                }
            }

            _ = ping.tick() => {
                let sent = time::timeout(WRITE_TIMEOUT, ws_tx.send(Message::Ping(Default::default()))).await;
                if !matches!(sent, Ok(Ok(()))) {
                    tracing::debug!(session_id = %session_id, "chat ping failed");
                    break;
                }
            }
        }
    }
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &str,
) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}

/// Adapts the socket's read half to the lifecycle controller.
struct WsFrames {
    inner: SplitStream<WebSocket>,
}

#[async_trait]
impl FrameSource for WsFrames {
    async fn next_frame(&mut self) -> Result<Frame, TransportError> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Frame::Text(text.as_str().to_owned())),
                Some(Ok(Message::Binary(data))) => return Ok(Frame::Binary(data.to_vec())),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Ok(Frame::Close),
                Some(Err(e)) => return Err(TransportError(e.to_string())),
            }
        }
    }
}
