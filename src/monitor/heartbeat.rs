//! Heartbeat for half-open detection.
//!
//! One heartbeat task runs per open transport:
//!
//! ```text
//! probe ──► wait for ack (deadline) ──► idle interval ──► probe ...
//!                  │
//!                  └── deadline passes ──► LinkFailure::HeartbeatTimeout
//! ```
//!
//! The ack wait and the idle wait never overlap, so on a healthy link
//! probes go out roughly every `interval` plus the round trip.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{debug, trace, warn};

use crate::identifiers::Generation;
use crate::transport::Transport;

use super::options::millis;
use super::state::LinkFailure;

// ============================================================================
// Heartbeat
// ============================================================================

/// Heartbeat timing for one transport.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Heartbeat {
    /// Deadline for each acknowledgment.
    pub timeout: Duration,
    /// Idle time after an acknowledgment.
    pub interval: Duration,
}

impl Heartbeat {
    /// Probes `transport` until it fails to answer.
    ///
    /// Acks arrive on `acks`, one per pong. Returns the failure that should
    /// tear the link down, or `None` once the ack channel closes (the link
    /// was torn down by someone else).
    pub async fn watch(
        self,
        generation: Generation,
        transport: Arc<dyn Transport>,
        mut acks: mpsc::UnboundedReceiver<()>,
    ) -> Option<LinkFailure> {
        loop {
            // Late acks from an earlier probe must not satisfy this one.
            while acks.try_recv().is_ok() {}

            if let Err(e) = transport.ping() {
                return Some(LinkFailure::Transport(e.to_string()));
            }
            debug!(%generation, "Heartbeat probe sent");

            match timeout(self.timeout, acks.recv()).await {
                Ok(Some(())) => trace!(%generation, "Heartbeat acknowledged"),
                Ok(None) => return None,
                Err(_) => {
                    warn!(
                        %generation,
                        timeout_ms = millis(self.timeout),
                        "Heartbeat not acknowledged"
                    );
                    return Some(LinkFailure::HeartbeatTimeout(self.timeout));
                }
            }

            sleep(self.interval).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
