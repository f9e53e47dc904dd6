//! Transport layer.
//!
//! The monitor link talks to the remote end through two seams:
//!
//! - [`Connector`] opens one physical socket per attempt and resolves once
//!   the open handshake completes.
//! - [`Transport`] is the open socket: fire-and-forget `send`/`ping`/`close`.
//!   Everything the socket observes comes back as [`TransportEvent`]s on the
//!   receiver returned alongside it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Monitor (Rust) │                              │  Remote monitor │
//! │                 │         WebSocket            │                 │
//! │  Connector      │─────────────────────────────►│                 │
//! │  → Transport    │◄────────────────────────────►│  Event stream   │
//! │  → events rx    │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `websocket` | `tokio-tungstenite` implementation |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use crate::error::Result;
use crate::protocol::Frame;

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use websocket::{WebSocketConnector, WebSocketTransport};

// ============================================================================
// TransportEvent
// ============================================================================

/// Something the socket observed.
///
/// `Closed` and `Error` are terminal: no further events follow them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// An inbound frame.
    Message(Frame),
    /// Acknowledgment of a [`Transport::ping`].
    Pong,
    /// The remote end closed the socket.
    Closed {
        /// Close code, if the remote sent one.
        code: Option<u16>,
        /// Close reason.
        reason: String,
    },
    /// Socket-level failure.
    Error(String),
}

impl TransportEvent {
    /// Returns `true` for `Closed` and `Error`.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed { .. } | Self::Error(_))
    }
}

// ============================================================================
// Transport
// ============================================================================

/// An open duplex socket.
///
/// Methods enqueue work and return immediately; failures that happen on the
/// wire surface later as [`TransportEvent::Error`].
pub trait Transport: Send + Sync {
    /// Queues a frame for sending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Transport`] if the socket is already gone.
    fn send(&self, frame: Frame) -> Result<()>;

    /// Queues a liveness probe. The remote answers with a pong.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Transport`] if the socket is already gone.
    fn ping(&self) -> Result<()>;

    /// Closes the socket. Safe to call more than once.
    fn close(&self);
}

// ============================================================================
// Link
// ============================================================================

/// An open transport together with its event stream.
pub struct Link {
    /// The open socket.
    pub transport: Arc<dyn Transport>,
    /// Events observed by the socket, in arrival order.
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").finish_non_exhaustive()
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Opens physical sockets.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a socket to `endpoint` and waits for the open handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be opened.
    async fn connect(&self, endpoint: &Url) -> Result<Link>;
}

// ============================================================================
// Tests
// ============================================================================
