//! Link timing and capacity options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use netmon_link::MonitorOptions;
//!
//! let options = MonitorOptions::new()
//!     .with_reconnect_delay(Duration::from_millis(500))
//!     .with_max_pending(256);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Fixed wait between failed open attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// How long a heartbeat probe may go unacknowledged.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10);

/// Idle time between an acknowledgment and the next probe.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Maximum in-flight requests before new ones are rejected.
pub const DEFAULT_MAX_PENDING: usize = 100;

// ============================================================================
// MonitorOptions
// ============================================================================

/// Timing and capacity knobs for a [`crate::Monitor`].
///
/// Reconnection has no attempt cap: the link retries every
/// `reconnect_delay` until it connects or is told to disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Wait between failed open attempts.
    pub reconnect_delay: Duration,

    /// Deadline for a heartbeat acknowledgment.
    pub heartbeat_timeout: Duration,

    /// Idle time after an acknowledgment before the next probe.
    pub heartbeat_interval: Duration,

    /// Maximum entries in the pending-request table.
    pub max_pending: usize,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl MonitorOptions {
    /// Creates options with the default timings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl MonitorOptions {
    /// Sets the wait between failed open attempts.
    #[inline]
    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the heartbeat acknowledgment deadline.
    #[inline]
    #[must_use]
    pub const fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    /// Sets the idle time between heartbeats.
    #[inline]
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the pending-request capacity.
    #[inline]
    #[must_use]
    pub const fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl MonitorOptions {
    /// Checks that every option is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero durations or zero capacity.
    pub fn validate(&self) -> Result<()> {
        if self.reconnect_delay.is_zero() {
            return Err(Error::config("reconnect_delay must be greater than zero"));
        }
        if self.heartbeat_timeout.is_zero() {
            return Err(Error::config("heartbeat_timeout must be greater than zero"));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(Error::config("heartbeat_interval must be greater than zero"));
        }
        if self.max_pending == 0 {
            return Err(Error::config("max_pending must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
#[inline]
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================
