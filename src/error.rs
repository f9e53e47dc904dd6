//! Error types for the monitor link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use netmon_link::{Monitor, Result};
//!
//! async fn example(monitor: &Monitor) -> Result<()> {
//!     monitor.start().await?;
//!     monitor.clear_log().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Link | [`Error::EndpointResolution`], [`Error::ConnectionCancelled`], [`Error::Transport`], [`Error::NotConnected`] |
//! | Liveness | [`Error::HeartbeatTimeout`], [`Error::Disconnected`] |
//! | Protocol | [`Error::Protocol`], [`Error::RequestTimeout`] |
//! | Remote | [`Error::ControlPlane`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::CorrelationId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the builder or options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Link Errors
    // ========================================================================
    /// The endpoint resolver failed to produce a target URL.
    #[error("Endpoint resolution failed: {message}")]
    EndpointResolution {
        /// Description of the resolution failure.
        message: String,
    },

    /// The open attempt was superseded, or the link was asked to disconnect
    /// while the attempt was in flight.
    #[error("Connection attempt cancelled")]
    ConnectionCancelled,

    /// Socket-level failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// An operation that needs an open transport was called without one.
    #[error("Not connected")]
    NotConnected,

    // ========================================================================
    // Liveness Errors
    // ========================================================================
    /// No heartbeat acknowledgment arrived within the deadline.
    #[error("Heartbeat not acknowledged within {timeout_ms}ms")]
    HeartbeatTimeout {
        /// Milliseconds waited for the acknowledgment.
        timeout_ms: u64,
    },

    /// The transport went away while the request was pending.
    #[error("Disconnected: {reason}")]
    Disconnected {
        /// Close reason, as reported by the transport or the caller.
        reason: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected frame.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// A request was not resolved within its timeout.
    #[error("Request {id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The correlation id that timed out.
        id: CorrelationId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Remote Errors
    // ========================================================================
    /// A control-plane call failed.
    #[error("Control plane error: {message}")]
    ControlPlane {
        /// Description of the control-plane failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an endpoint resolution error.
    #[inline]
    pub fn endpoint_resolution(message: impl Into<String>) -> Self {
        Self::EndpointResolution {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a heartbeat timeout error.
    #[inline]
    pub fn heartbeat_timeout(timeout_ms: u64) -> Self {
        Self::HeartbeatTimeout { timeout_ms }
    }

    /// Creates a disconnected error.
    #[inline]
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::Disconnected {
            reason: reason.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(id: CorrelationId, timeout_ms: u64) -> Self {
        Self::RequestTimeout { id, timeout_ms }
    }

    /// Creates a control-plane error.
    #[inline]
    pub fn control_plane(message: impl Into<String>) -> Self {
        Self::ControlPlane {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::HeartbeatTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this error describes a link failure.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::EndpointResolution { .. }
                | Self::ConnectionCancelled
                | Self::Transport { .. }
                | Self::NotConnected
                | Self::HeartbeatTimeout { .. }
                | Self::Disconnected { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry once the link is back.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EndpointResolution { .. }
                | Self::Transport { .. }
                | Self::NotConnected
                | Self::HeartbeatTimeout { .. }
                | Self::Disconnected { .. }
                | Self::RequestTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
