//! Link state types.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use crate::error::Error;

use super::options::millis;

// ============================================================================
// LinkState
// ============================================================================

/// Observable phase of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// Never asked to connect.
    Idle,
    /// A reconnect loop is running.
    Connecting,
    /// A transport is open and the heartbeat is armed.
    Open,
    /// The transport was torn down and no reconnect is running.
    Closed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

// ============================================================================
// ConnectOutcome
// ============================================================================

/// How a connect or reconnect call ended.
///
/// The reconnect loop never gives up on its own, so the only way it ends
/// without a connection is an explicit disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectOutcome {
    /// A transport is open.
    Connected,
    /// The caller disconnected before a transport opened.
    Cancelled,
}

impl ConnectOutcome {
    /// Returns `true` for [`ConnectOutcome::Connected`].
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

// ============================================================================
// LinkFailure
// ============================================================================

/// Why a transport was torn down.
///
/// Each pending request gets its own [`Error`] built from this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkFailure {
    /// The remote closed the socket.
    Closed { code: Option<u16>, reason: String },
    /// Socket-level error.
    Transport(String),
    /// The heartbeat went unacknowledged.
    HeartbeatTimeout(Duration),
    /// The caller asked for the teardown.
    Requested(&'static str),
}

impl LinkFailure {
    /// Builds the error handed to pending requests.
    pub fn to_error(&self) -> Error {
        match self {
            Self::Closed { code, reason } => Error::disconnected(match code {
                Some(code) => format!("closed by remote ({code}) {reason}").trim_end().to_string(),
                None => format!("closed by remote {reason}").trim_end().to_string(),
            }),
            Self::Transport(message) => Error::transport(message.clone()),
            Self::HeartbeatTimeout(timeout) => Error::heartbeat_timeout(millis(*timeout)),
            Self::Requested(reason) => Error::disconnected(*reason),
        }
    }
}

impl fmt::Display for LinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_error(), f)
    }
}

// ============================================================================
// Tests
// ============================================================================
