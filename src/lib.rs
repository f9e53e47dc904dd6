//! Netmon Link - self-healing link to a remote network-traffic monitor.
//!
//! This library keeps one logical duplex stream open to a remote monitor
//! that streams captured packet/session events and accepts control
//! commands.
//!
//! # Architecture
//!
//! - **Monitor**: the logical link; survives any number of physical sockets
//! - **Endpoint resolver**: supplies the socket URL before every attempt
//! - **Transport**: one physical socket per attempt (WebSocket by default)
//! - **Control plane**: HTTP API used to toggle capture on the instance
//!
//! Key behaviors:
//!
//! - Failed attempts retry every second until connected or disconnected
//! - Concurrent connect/reconnect calls share a single attempt
//! - A heartbeat tears down half-open sockets and reconnects
//! - Callbacks from superseded sockets are inert (generation-checked)
//!
//! # Quick Start
//!
//! ```no_run
//! use netmon_link::{HandlerResult, Monitor, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let monitor = Monitor::builder()
//!         .endpoint_str("wss://monitor.example/netmon")?
//!         .build()?;
//!
//!     monitor.set_handler(|message| async move {
//!         println!("event {:?}: {:?}", message.id, message.payload);
//!         HandlerResult::Ok(false)
//!     });
//!
//!     monitor.connect().await;
//!     monitor.clear_log().await?;
//!     monitor.disconnect();
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`monitor`] | [`Monitor`], builder, options, state machine |
//! | [`protocol`] | Frame decoding and control messages |
//! | [`transport`] | Transport seams and WebSocket implementation |
//! | [`remote`] | Endpoint resolver and control-plane seams |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// The monitor link.
///
/// Use [`Monitor::builder()`] to create a configured monitor.
pub mod monitor;

/// Wire framing.
pub mod protocol;

/// External collaborators: endpoint resolution and control plane.
pub mod remote;

/// Transport seams and the WebSocket transport.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Monitor types
pub use monitor::{
    ConnectOutcome, HandlerError, HandlerResult, LinkState, Monitor, MonitorBuilder,
    MonitorOptions,
};

// Protocol types
pub use protocol::{ControlMessage, Frame, InboundMessage, Payload};

// Collaborator types
pub use remote::{CaptureAction, ControlPlane, EndpointResolver, Instance, StaticResolver};

// Transport types
pub use transport::{Connector, Link, Transport, TransportEvent, WebSocketConnector};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CorrelationId, Generation, InstanceId, ProjectId};
