//! Monitor handle and public lifecycle API.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use netmon_link::{HandlerResult, Instance, Monitor, Result, StaticResolver};
//! # use netmon_link::ControlPlane;
//!
//! # async fn example(api: Arc<dyn ControlPlane>) -> Result<()> {
//! let monitor = Monitor::builder()
//!     .resolver(StaticResolver::parse("wss://monitor.example/netmon")?)
//!     .control_plane_arc(api)
//!     .instance(Instance::new("project", "instance"))
//!     .build()?;
//!
//! monitor.set_handler(|message| async move {
//!     println!("captured {:?}: {:?}", message.id, message.payload);
//!     HandlerResult::Ok(false)
//! });
//!
//! monitor.start().await?;
//! monitor.clear_log().await?;
//! monitor.stop().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::info;

use crate::error::{Error, Result};
use crate::identifiers::{CorrelationId, Generation};
use crate::protocol::{ControlMessage, Frame, InboundMessage};
use crate::remote::{CaptureAction, ControlPlane, Instance};

use super::builder::MonitorBuilder;
use super::handler::HandlerResult;
use super::link::LinkCore;
use super::options::{MonitorOptions, millis};
use super::state::{ConnectOutcome, LinkState};

// ============================================================================
// Types
// ============================================================================

/// Control-plane access for capture toggles.
pub(crate) struct CaptureControl {
    pub plane: Arc<dyn ControlPlane>,
    pub instance: Instance,
}

// ============================================================================
// Monitor
// ============================================================================

/// Self-healing link to a remote traffic monitor.
///
/// One `Monitor` represents one logical link; it survives any number of
/// physical reconnects and connect/disconnect cycles. Clones share the
/// same link.
///
/// The link keeps reconnecting until [`Monitor::disconnect`] (or
/// [`Monitor::stop`]) is called; dropping the handle does not close it.
#[derive(Clone)]
pub struct Monitor {
    pub(crate) link: Arc<LinkCore>,
    pub(crate) capture: Option<Arc<CaptureControl>>,
}

// ============================================================================
// Monitor - Display
// ============================================================================

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("pending", &self.pending_count())
            .field("instance", &self.capture.as_ref().map(|c| &c.instance))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Monitor - Connection Lifecycle
// ============================================================================

impl Monitor {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::new()
    }

    /// Connects, or joins the connection attempt already running.
    ///
    /// Returns immediately if already connected. Otherwise retries every
    /// `reconnect_delay` without limit until a transport opens
    /// ([`ConnectOutcome::Connected`]) or [`Monitor::disconnect`] is called
    /// ([`ConnectOutcome::Cancelled`]). Resolver and open failures are
    /// retried, never returned.
    pub async fn connect(&self) -> ConnectOutcome {
        self.link.connect().await
    }

    /// Force-closes the current transport (if any) and connects again.
    ///
    /// Concurrent calls share one attempt. Pending requests on the closed
    /// transport fail with [`Error::Disconnected`]. Returns
    /// [`ConnectOutcome::Cancelled`] straight away if the link is not
    /// desired.
    pub async fn reconnect(&self) -> ConnectOutcome {
        self.link.reconnect().await
    }

    /// Cancels any reconnect in progress and closes the link.
    ///
    /// Pending requests fail with [`Error::Disconnected`] and the handler is
    /// cleared. Safe to call when already disconnected.
    pub fn disconnect(&self) {
        self.link.disconnect();
    }
}

// ============================================================================
// Monitor - Capture Control
// ============================================================================

impl Monitor {
    /// Connects and enables capture on the instance.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionCancelled`] if disconnected before the link opened
    /// - [`Error::Config`] if no control plane was configured
    /// - [`Error::ControlPlane`] if the enable call failed
    pub async fn start(&self) -> Result<()> {
        if !self.connect().await.is_connected() {
            return Err(Error::ConnectionCancelled);
        }
        self.set_capture(CaptureAction::Enable).await
    }

    /// Disables capture on the instance, then disconnects.
    ///
    /// The link is closed even if the disable call fails.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no control plane was configured
    /// - [`Error::ControlPlane`] if the disable call failed
    pub async fn stop(&self) -> Result<()> {
        let result = self.set_capture(CaptureAction::Disable).await;
        self.disconnect();
        result
    }

    /// Asks the remote monitor to drop everything captured so far.
    ///
    /// Reuses the open transport if there is one and leaves it open.
    /// Otherwise opens a short-lived connection, sends the command, and
    /// disconnects again.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionCancelled`] if disconnected while opening
    /// - [`Error::Transport`] if the command could not be queued
    pub async fn clear_log(&self) -> Result<()> {
        let frame = ControlMessage::Clear.to_frame()?;

        if self.is_connected() {
            return self.link.send(frame);
        }

        if !self.connect().await.is_connected() {
            return Err(Error::ConnectionCancelled);
        }
        let result = self.link.send(frame);
        self.disconnect();
        result
    }

    /// Issues a capture toggle through the control plane.
    async fn set_capture(&self, action: CaptureAction) -> Result<()> {
        let capture = self.capture.as_ref().ok_or_else(|| {
            Error::config("capture toggles need a control plane and an instance")
        })?;

        let path = capture.instance.capture_path(action);
        capture.plane.post(&path).await.map_err(|e| match e {
            Error::ControlPlane { .. } => e,
            other => Error::control_plane(other.to_string()),
        })?;

        info!(instance = %capture.instance.id(), action = action.as_str(), "Capture toggled");
        Ok(())
    }
}

// ============================================================================
// Monitor - Messaging
// ============================================================================

impl Monitor {
    /// Replaces the message handler.
    ///
    /// The handler receives every decoded inbound frame from the canonical
    /// transport. Resolving to `Ok(true)` finishes the frame's correlation
    /// id, completing the matching [`Monitor::request`]; `Ok(false)` leaves
    /// it pending for further frames. Frames without an id are delivered
    /// too; their result is ignored. Errors and panics are logged and
    /// treated as `Ok(false)`.
    ///
    /// The handler runs on the link's event task with no lock held and may
    /// call back into the monitor, both before and inside its future.
    pub fn set_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(InboundMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.link.handler.set(handler);
    }

    /// Removes the message handler.
    pub fn clear_handler(&self) {
        self.link.handler.clear();
    }

    /// Returns `true` if a handler is registered.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.link.handler.is_set()
    }

    /// Sends a frame over the open transport.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no transport is open
    /// - [`Error::Transport`] if the frame could not be queued
    pub fn send(&self, frame: Frame) -> Result<()> {
        self.link.send(frame)
    }

    /// Serializes `value` and sends it as a text frame.
    ///
    /// # Errors
    ///
    /// As [`Monitor::send`], plus [`Error::Json`] if serialization fails.
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        self.send(Frame::json(value)?)
    }

    /// Sends `frame` and waits until the handler finishes `id`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no transport is open
    /// - [`Error::Protocol`] if `id` is already pending or the table is full
    /// - the link failure ([`Error::Disconnected`], [`Error::Transport`],
    ///   [`Error::HeartbeatTimeout`]) if the transport goes away first
    pub async fn request(&self, id: impl Into<CorrelationId>, frame: Frame) -> Result<()> {
        let (_, reply) = self.link.register(id.into(), frame)?;
        reply
            .await
            .unwrap_or_else(|_| Err(Error::disconnected("request dropped")))
    }

    /// Like [`Monitor::request`], giving up after `request_timeout`.
    ///
    /// # Errors
    ///
    /// As [`Monitor::request`], plus [`Error::RequestTimeout`]; the id is
    /// removed from the pending table when that happens.
    pub async fn request_with_timeout(
        &self,
        id: impl Into<CorrelationId>,
        frame: Frame,
        request_timeout: Duration,
    ) -> Result<()> {
        let id = id.into();
        let (generation, reply) = self.link.register(id, frame)?;

        match timeout(request_timeout, reply).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::disconnected("request dropped")),
            Err(_) => {
                self.link.forget(generation, id);
                Err(Error::request_timeout(id, millis(request_timeout)))
            }
        }
    }
}

// ============================================================================
// Monitor - Accessors
// ============================================================================

impl Monitor {
    /// Returns `true` while a transport is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Returns `true` between [`Monitor::connect`] and [`Monitor::disconnect`].
    #[inline]
    #[must_use]
    pub fn is_desired(&self) -> bool {
        self.link.is_desired()
    }

    /// Returns the observable phase of the link.
    #[inline]
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.link.link_state()
    }

    /// Returns the generation of the open transport, if any.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Option<Generation> {
        self.link.generation()
    }

    /// Returns the number of in-flight requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.link.pending_count()
    }

    /// Returns the options the monitor was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &MonitorOptions {
        self.link.options()
    }

    /// Returns the monitored instance, if configured.
    #[inline]
    #[must_use]
    pub fn instance(&self) -> Option<&Instance> {
        self.capture.as_ref().map(|capture| &capture.instance)
    }
}
