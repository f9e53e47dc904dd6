//! WebSocket transport and socket loop.
//!
//! # Socket Loop
//!
//! Each open socket gets one tokio task that handles:
//!
//! - Incoming frames, pongs and close/error from the remote
//! - Outgoing send/ping/close commands from the link
//!
//! Observations are forwarded in arrival order on an unbounded channel; the
//! task exits after the first terminal event or an explicit close.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::Frame;

use super::{Connector, Link, Transport, TransportEvent};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for the open handshake.
const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Internal commands for the socket loop.
#[derive(Debug)]
enum SocketCommand {
    /// Write a frame.
    Send(Frame),
    /// Write a ping.
    Ping,
    /// Close the socket and stop.
    Close,
}

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Handle to an open WebSocket.
///
/// Cheap to share; all methods enqueue onto the socket loop.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    command_tx: mpsc::UnboundedSender<SocketCommand>,
}

impl Transport for WebSocketTransport {
    fn send(&self, frame: Frame) -> Result<()> {
        self.command_tx
            .send(SocketCommand::Send(frame))
            .map_err(|_| Error::transport("socket loop has stopped"))
    }

    fn ping(&self) -> Result<()> {
        self.command_tx
            .send(SocketCommand::Ping)
            .map_err(|_| Error::transport("socket loop has stopped"))
    }

    fn close(&self) {
        let _ = self.command_tx.send(SocketCommand::Close);
    }
}

impl WebSocketTransport {
    /// Wraps an already-open socket and spawns its loop.
    fn spawn(socket: Socket) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_socket_loop(socket, command_rx, event_tx));

        (Self { command_tx }, event_rx)
    }
}

// ============================================================================
// WebSocketConnector
// ============================================================================

/// [`Connector`] backed by `tokio-tungstenite`.
///
/// Supports `ws://` and `wss://` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct WebSocketConnector {
    open_timeout: Duration,
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketConnector {
    /// Creates a connector with the default 30s handshake timeout.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            open_timeout: DEFAULT_OPEN_TIMEOUT,
        }
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub const fn with_open_timeout(mut self, open_timeout: Duration) -> Self {
        self.open_timeout = open_timeout;
        self
    }

    /// Returns the handshake timeout.
    #[inline]
    #[must_use]
    pub const fn open_timeout(&self) -> Duration {
        self.open_timeout
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &Url) -> Result<Link> {
        match endpoint.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::transport(format!(
                    "unsupported endpoint scheme `{other}`"
                )));
            }
        }

        let (socket, response) = timeout(self.open_timeout, connect_async(endpoint.as_str()))
            .await
            .map_err(|_| {
                Error::transport(format!(
                    "open handshake timed out after {}ms",
                    self.open_timeout.as_millis()
                ))
            })??;

        debug!(%endpoint, status = %response.status(), "WebSocket handshake completed");

        let (transport, events) = WebSocketTransport::spawn(socket);

        Ok(Link {
            transport: Arc::new(transport),
            events,
        })
    }
}

// ============================================================================
// Socket Loop
// ============================================================================

/// Pumps one socket until it closes, fails, or is told to stop.
async fn run_socket_loop(
    socket: Socket,
    mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    let (mut ws_write, mut ws_read) = socket.split();

    loop {
        tokio::select! {
            message = ws_read.next() => {
                let event = match message {
                    Some(Ok(Message::Text(text))) => {
                        trace!(len = text.len(), "Text frame received");
                        TransportEvent::Message(Frame::Text(text.as_str().to_owned()))
                    }

                    Some(Ok(Message::Binary(bytes))) => {
                        trace!(len = bytes.len(), "Binary frame received");
                        TransportEvent::Message(Frame::Binary(bytes.to_vec()))
                    }

                    Some(Ok(Message::Pong(_))) => TransportEvent::Pong,

                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (Some(u16::from(f.code)), f.reason.to_string()))
                            .unwrap_or((None, String::new()));
                        debug!(?code, %reason, "WebSocket closed by remote");
                        TransportEvent::Closed { code, reason }
                    }

                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        TransportEvent::Error(e.to_string())
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        TransportEvent::Closed {
                            code: None,
                            reason: "stream ended".to_string(),
                        }
                    }

                    // Pings are answered by tungstenite; raw frames never surface.
                    Some(Ok(_)) => continue,
                };

                let terminal = event.is_terminal();
                let _ = event_tx.send(event);
                if terminal {
                    break;
                }
            }

            command = command_rx.recv() => {
                let result = match command {
                    Some(SocketCommand::Send(frame)) => {
                        trace!(len = frame.len(), "Sending frame");
                        ws_write.send(into_message(frame)).await
                    }

                    Some(SocketCommand::Ping) => {
                        ws_write.send(Message::Ping(Default::default())).await
                    }

                    Some(SocketCommand::Close) | None => {
                        debug!("Closing WebSocket");
                        let _ = ws_write.close().await;
                        break;
                    }
                };

                if let Err(e) = result {
                    warn!(error = %e, "WebSocket write failed");
                    let _ = event_tx.send(TransportEvent::Error(e.to_string()));
                    break;
                }
            }
        }
    }

    debug!("Socket loop terminated");
}

/// Converts a frame into a tungstenite message.
fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(bytes) => Message::Binary(bytes.into()),
    }
}

// ============================================================================
// Tests
// ============================================================================
