//! Wire framing for the monitor link.
//!
//! The link treats message contents as opaque: it only needs the
//! correlation id to maintain the pending table. Everything else is handed
//! to the registered handler untouched.
//!
//! # Frame Shapes
//!
//! | Shape | Correlation id | Payload |
//! |-------|----------------|---------|
//! | Text | JSON field `id` | the whole JSON object |
//! | Binary | bytes `[0..4)` little-endian | bytes `[8..)` |
//!
//! Bytes `[4..8)` of a binary frame are reserved and ignored.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `frame` | Raw text/binary frames and inbound decoding |
//! | `control` | Outbound control messages |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound control messages.
pub mod control;

/// Raw frames and inbound decoding.
pub mod frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use control::ControlMessage;
pub use frame::{BINARY_HEADER_LEN, Frame, InboundMessage, Payload};
