//! The monitor link.
//!
//! # Lifecycle
//!
//! ```text
//!            connect()                 open ok
//!   Idle ───────────────► Connecting ───────────► Open
//!                          ▲      │                 │
//!          desired & retry │      │ disconnect()    │ close / error /
//!                          │      ▼                 │ heartbeat timeout
//!                          └──── Closed ◄───────────┘
//! ```
//!
//! While the link is desired, every teardown loops back to `Connecting`;
//! attempts repeat every `reconnect_delay` with no cap.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | [`MonitorBuilder`] |
//! | `core` | [`Monitor`] public API |
//! | `handler` | Single-slot message handler |
//! | `heartbeat` | Liveness probing |
//! | `link` | Connection state machine |
//! | `options` | [`MonitorOptions`] |
//! | `pending` | Pending-request table |
//! | `state` | [`LinkState`], [`ConnectOutcome`] |

// ============================================================================
// Submodules
// ============================================================================

/// Builder for [`Monitor`].
pub mod builder;

/// Monitor handle and public API.
pub mod core;

/// Message handler slot.
pub mod handler;

/// Heartbeat for half-open detection.
mod heartbeat;

/// Connection state machine.
mod link;

/// Timing and capacity options.
pub mod options;

/// Pending-request table.
mod pending;

/// Link state types.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::MonitorBuilder;
pub use core::Monitor;
pub use handler::{HandlerError, HandlerResult};
pub use options::MonitorOptions;
pub use state::{ConnectOutcome, LinkState};
