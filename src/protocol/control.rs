//! Outbound control messages.
//!
//! Control messages travel as text frames over the same transport as the
//! captured traffic.
//!
//! # Format
//!
//! ```json
//! { "type": "clear" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::Result;

use super::Frame;

// ============================================================================
// ControlMessage
// ============================================================================

/// A command sent to the remote monitor over the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// Drop everything captured so far.
    Clear,
}

impl ControlMessage {
    /// Encodes the message as a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    #[inline]
    pub fn to_frame(&self) -> Result<Frame> {
        Frame::json(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_wire_format() {
        let frame = ControlMessage::Clear.to_frame().unwrap();
        assert_eq!(frame, Frame::Text(r#"{"type":"clear"}"#.to_string()));
    }
}
