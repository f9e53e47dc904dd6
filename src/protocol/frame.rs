//! Raw frames and inbound decoding.
//!
//! Every inbound frame is reduced to an [`InboundMessage`]: an optional
//! correlation id plus an opaque payload. Binary frames always carry an id;
//! text frames may omit it (unsolicited capture events).

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::CorrelationId;

// ============================================================================
// Constants
// ============================================================================

/// Length of the fixed binary header (id + reserved word).
pub const BINARY_HEADER_LEN: usize = 8;

/// Length of the correlation id at the start of the binary header.
const BINARY_ID_LEN: usize = 4;

// ============================================================================
// Frame
// ============================================================================

/// A single message as carried by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

impl Frame {
    /// Serializes `value` into a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::Text(serde_json::to_string(value)?))
    }

    /// Builds a binary frame with `id` in the header and zeroed reserved bytes.
    #[must_use]
    pub fn binary(id: CorrelationId, payload: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(BINARY_HEADER_LEN + payload.len());
        bytes.extend_from_slice(&id.to_le_bytes());
        bytes.extend_from_slice(&[0; BINARY_HEADER_LEN - BINARY_ID_LEN]);
        bytes.extend_from_slice(payload);
        Self::Binary(bytes)
    }

    /// Returns the frame size in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the frame carries no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Payload
// ============================================================================

/// Opaque message body handed to the registered handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured body of a text frame (the whole JSON object, `id` included).
    Json(Value),
    /// Body of a binary frame, header stripped.
    Binary(Vec<u8>),
}

impl Payload {
    /// Returns the binary body, if any.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) => Some(bytes.as_slice()),
            Self::Json(_) => None,
        }
    }

    /// Returns the JSON body, if any.
    #[inline]
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Binary(_) => None,
        }
    }
}

// ============================================================================
// InboundMessage
// ============================================================================

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Correlation id carried by the frame, if any.
    pub id: Option<CorrelationId>,
    /// Opaque body.
    pub payload: Payload,
}

impl InboundMessage {
    /// Decodes a raw frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if a text frame is not valid JSON
    /// - [`Error::Protocol`] if a numeric id is out of range, or a binary
    ///   frame is shorter than its header
    pub fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Text(text) => Self::decode_text(&text),
            Frame::Binary(bytes) => Self::decode_binary(bytes),
        }
    }

    /// Decodes a text frame: JSON, with a numeric `id` field when the frame
    /// answers a request.
    fn decode_text(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        let id = match value.get("id").and_then(Value::as_u64) {
            Some(id) => Some(CorrelationId::new(u32::try_from(id).map_err(|_| {
                Error::protocol(format!("correlation id {id} out of range"))
            })?)),
            None => None,
        };

        Ok(Self {
            id,
            payload: Payload::Json(value),
        })
    }

    /// Decodes a binary frame: 4-byte LE id, 4 reserved bytes, payload.
    fn decode_binary(mut bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < BINARY_HEADER_LEN {
            return Err(Error::protocol(format!(
                "binary frame of {} bytes is shorter than the {BINARY_HEADER_LEN}-byte header",
                bytes.len()
            )));
        }

        let mut id = [0u8; BINARY_ID_LEN];
        id.copy_from_slice(&bytes[..BINARY_ID_LEN]);
        let payload = bytes.split_off(BINARY_HEADER_LEN);

        Ok(Self {
            id: Some(CorrelationId::new(u32::from_le_bytes(id))),
            payload: Payload::Binary(payload),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_binary_id_42_with_three_byte_payload() {
        let bytes = vec![42, 0, 0, 0, 0xde, 0xad, 0xbe, 0xef, 1, 2, 3];
        let message = InboundMessage::decode(Frame::Binary(bytes)).unwrap();

        assert_eq!(message.id, Some(CorrelationId::new(42)));
        assert_eq!(message.payload.as_bytes(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_binary_header_only() {
        let message = InboundMessage::decode(Frame::binary(CorrelationId::new(5), &[])).unwrap();
        assert_eq!(message.id, Some(CorrelationId::new(5)));
        assert_eq!(message.payload, Payload::Binary(Vec::new()));
    }

    #[test]
    fn test_binary_too_short() {
        let err = InboundMessage::decode(Frame::Binary(vec![1, 0, 0])).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_text_frame_keeps_whole_object() {
        let frame = Frame::json(&json!({"id": 3, "kind": "session", "bytes": 120})).unwrap();
        let message = InboundMessage::decode(frame).unwrap();

        assert_eq!(message.id, Some(CorrelationId::new(3)));
        let body = message.payload.as_json().unwrap();
        assert_eq!(body["kind"], "session");
        assert_eq!(body["id"], 3);
    }

    #[test]
    fn test_text_frame_without_id() {
        let frame = Frame::Text(r#"{"kind":"flow","src":"10.0.0.2"}"#.into());
        let message = InboundMessage::decode(frame).unwrap();
        assert_eq!(message.id, None);
        assert_eq!(message.payload.as_json().unwrap()["kind"], "flow");

        let frame = Frame::Text(r#"{"id":"abc"}"#.into());
        assert_eq!(InboundMessage::decode(frame).unwrap().id, None);
    }

    #[test]
    fn test_text_frame_id_out_of_range() {
        let frame = Frame::Text(r#"{"id":4294967296}"#.into());
        let err = InboundMessage::decode(frame).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_text_frame_invalid_json() {
        let err = InboundMessage::decode(Frame::Text("{".into())).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_frame_len() {
        assert_eq!(Frame::binary(CorrelationId::new(1), &[9, 9]).len(), 10);
        assert!(Frame::Text(String::new()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_binary_decode_ignores_reserved_bytes(
            id in any::<u32>(),
            reserved in any::<[u8; 4]>(),
            payload in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let mut bytes = id.to_le_bytes().to_vec();
            bytes.extend_from_slice(&reserved);
            bytes.extend_from_slice(&payload);

            let message = InboundMessage::decode(Frame::Binary(bytes)).unwrap();
            prop_assert_eq!(message.id, Some(CorrelationId::new(id)));
            prop_assert_eq!(message.payload, Payload::Binary(payload));
        }
    }
}
