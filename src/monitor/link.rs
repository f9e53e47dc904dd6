//! Connection state machine.
//!
//! [`LinkCore`] owns everything that changes as sockets come and go: the
//! canonical transport, its pending-request table, its heartbeat and event
//! pump, and the single in-flight reconnect loop.
//!
//! # Generations
//!
//! Every open attempt stamps itself with a fresh [`Generation`]; so does
//! every explicit disconnect. Tasks that belong to one transport (event
//! pump, heartbeat, handler completions) carry the generation they were
//! started with and check it under the state lock before acting. A stale
//! generation is inert.
//!
//! # Lock Order
//!
//! `state` → `desired` → `handler`. None of them is held across an await.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CorrelationId, Generation};
use crate::protocol::{Frame, InboundMessage};
use crate::remote::EndpointResolver;
use crate::transport::{Connector, Link, Transport, TransportEvent};

use super::handler::{self, HandlerSlot};
use super::heartbeat::Heartbeat;
use super::options::{MonitorOptions, millis};
use super::pending::PendingTable;
use super::state::{ConnectOutcome, LinkFailure, LinkState};

// ============================================================================
// Types
// ============================================================================

/// Outcome of the in-flight reconnect loop, shared by every caller.
type ReconnectFuture = Shared<BoxFuture<'static, ConnectOutcome>>;

/// The single running reconnect loop.
struct ReconnectFlight {
    id: u64,
    future: ReconnectFuture,
}

/// The canonical transport and the tasks bound to it.
struct ActiveTransport {
    generation: Generation,
    transport: Arc<dyn Transport>,
    acks: mpsc::UnboundedSender<()>,
    pump: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

/// Mutable link state, guarded by one lock.
#[derive(Default)]
struct State {
    /// Most recently stamped generation.
    latest: Generation,
    connected: bool,
    active: Option<ActiveTransport>,
    pending: PendingTable,
    flight: Option<ReconnectFlight>,
    flights_started: u64,
}

impl State {
    /// Returns `true` if `generation` owns the canonical transport.
    fn is_current(&self, generation: Generation) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }

    /// Stamps a new generation, invalidating any attempt in flight.
    fn supersede(&mut self) -> Generation {
        self.latest = self.latest.next();
        self.latest
    }

    /// Clears the flight slot if it still belongs to `id`.
    fn finish_flight(&mut self, id: u64) {
        if self.flight.as_ref().is_some_and(|flight| flight.id == id) {
            self.flight = None;
        }
    }

    /// Tears down the canonical transport.
    ///
    /// Fails every pending request once, stops the pump and heartbeat, and
    /// closes the socket. Returns the torn-down generation and how many
    /// requests were failed, or `None` if nothing was open.
    fn teardown(&mut self, failure: &LinkFailure) -> Option<(Generation, usize)> {
        self.connected = false;
        let failed = self.pending.fail_all(|| failure.to_error());

        let active = self.active.take()?;
        active.pump.abort();
        active.heartbeat.abort();
        active.transport.close();

        Some((active.generation, failed))
    }
}

// ============================================================================
// LinkCore
// ============================================================================

/// Shared core behind every [`crate::Monitor`] clone.
pub(crate) struct LinkCore {
    resolver: Arc<dyn EndpointResolver>,
    connector: Arc<dyn Connector>,
    options: MonitorOptions,
    /// Caller intent; `false` is the cancellation signal.
    desired: watch::Sender<bool>,
    state: Mutex<State>,
    pub(crate) handler: HandlerSlot,
}

impl LinkCore {
    /// Creates an idle link.
    pub fn new(
        resolver: Arc<dyn EndpointResolver>,
        connector: Arc<dyn Connector>,
        options: MonitorOptions,
    ) -> Self {
        let (desired, _) = watch::channel(false);
        Self {
            resolver,
            connector,
            options,
            desired,
            state: Mutex::new(State::default()),
            handler: HandlerSlot::default(),
        }
    }

    /// Returns the options the link was built with.
    #[inline]
    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }
}

// ============================================================================
// LinkCore - Lifecycle
// ============================================================================

impl LinkCore {
    /// Marks the link desired and waits until it is open or cancelled.
    pub async fn connect(self: &Arc<Self>) -> ConnectOutcome {
        let flight = {
            let mut state = self.state.lock();
            self.desired.send_replace(true);
            if state.connected {
                return ConnectOutcome::Connected;
            }
            self.join_flight(&mut state)
        };
        flight.await
    }

    /// Force-closes any open transport and runs (or joins) the reconnect loop.
    pub async fn reconnect(self: &Arc<Self>) -> ConnectOutcome {
        let flight = {
            let mut state = self.state.lock();
            let failure = LinkFailure::Requested("reconnect requested");
            if let Some((generation, failed)) = state.teardown(&failure) {
                info!(%generation, failed, "Transport force-closed for reconnect");
            }
            self.join_flight(&mut state)
        };
        flight.await
    }

    /// Cancels any reconnect and tears the link down. Idempotent.
    pub fn disconnect(&self) {
        {
            let mut state = self.state.lock();
            self.desired.send_replace(false);
            state.supersede();

            let failure = LinkFailure::Requested("disconnect requested");
            if let Some((generation, failed)) = state.teardown(&failure) {
                info!(%generation, failed, "Monitor link closed");
            }
        }
        self.handler.clear();
    }

    /// Returns the running reconnect loop, starting one if needed.
    fn join_flight(self: &Arc<Self>, state: &mut State) -> ReconnectFuture {
        if let Some(flight) = &state.flight {
            trace!(flight = flight.id, "Joining in-flight reconnect");
            return flight.future.clone();
        }

        state.flights_started += 1;
        let id = state.flights_started;

        let task = tokio::spawn(Arc::clone(self).run_reconnect_loop(id));
        let future = async move { task.await.unwrap_or(ConnectOutcome::Cancelled) }
            .boxed()
            .shared();

        state.flight = Some(ReconnectFlight {
            id,
            future: future.clone(),
        });

        debug!(flight = id, "Reconnect started");
        future
    }

    /// Retries open attempts until one succeeds or the link is undesired.
    async fn run_reconnect_loop(self: Arc<Self>, flight: u64) -> ConnectOutcome {
        let mut attempt: u64 = 0;

        loop {
            {
                let mut state = self.state.lock();
                if !*self.desired.borrow() {
                    state.finish_flight(flight);
                    debug!(flight, attempt, "Reconnect abandoned");
                    return ConnectOutcome::Cancelled;
                }
            }

            attempt += 1;
            match self.open_attempt(flight).await {
                Ok(generation) => {
                    debug!(flight, attempt, %generation, "Reconnect succeeded");
                    return ConnectOutcome::Connected;
                }
                Err(Error::ConnectionCancelled) => {
                    debug!(flight, attempt, "Open attempt cancelled");
                }
                Err(e) => {
                    warn!(
                        flight,
                        attempt,
                        error = %e,
                        retry_in_ms = millis(self.options.reconnect_delay),
                        "Open attempt failed"
                    );
                }
            }

            let mut desired = self.desired.subscribe();
            tokio::select! {
                () = sleep(self.options.reconnect_delay) => {}
                () = until_undesired(&mut desired) => {}
            }
        }
    }

    /// One open attempt: resolve, open, install.
    async fn open_attempt(self: &Arc<Self>, flight: u64) -> Result<Generation> {
        let generation = self.state.lock().supersede();
        let mut desired = self.desired.subscribe();

        debug!(%generation, "Resolving monitor endpoint");
        let endpoint = tokio::select! {
            biased;
            () = until_undesired(&mut desired) => return Err(Error::ConnectionCancelled),
            resolved = self.resolver.resolve_endpoint() => resolved.map_err(resolution_error)?,
        };

        debug!(%generation, %endpoint, "Opening transport");
        let link = tokio::select! {
            biased;
            () = until_undesired(&mut desired) => return Err(Error::ConnectionCancelled),
            opened = self.connector.connect(&endpoint) => opened?,
        };

        self.install(generation, flight, link)
    }

    /// Makes a freshly opened transport canonical, unless it was superseded.
    fn install(self: &Arc<Self>, generation: Generation, flight: u64, link: Link) -> Result<Generation> {
        let Link { transport, events } = link;

        let mut state = self.state.lock();
        if state.latest != generation || !*self.desired.borrow() {
            drop(state);
            transport.close();
            debug!(%generation, "Opened transport was superseded; closed it");
            return Err(Error::ConnectionCancelled);
        }

        if let Some((previous, failed)) = state.teardown(&LinkFailure::Requested("transport replaced")) {
            debug!(%previous, failed, "Replaced canonical transport");
        }
        state.pending = PendingTable::default();

        let (acks, ack_rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(Arc::clone(self).pump_events(generation, events));

        let timing = Heartbeat {
            timeout: self.options.heartbeat_timeout,
            interval: self.options.heartbeat_interval,
        };
        let core = Arc::clone(self);
        let probed = Arc::clone(&transport);
        let heartbeat = tokio::spawn(async move {
            if let Some(failure) = timing.watch(generation, probed, ack_rx).await {
                core.link_failed(generation, failure);
            }
        });

        state.active = Some(ActiveTransport {
            generation,
            transport,
            acks,
            pump,
            heartbeat,
        });
        state.connected = true;
        state.finish_flight(flight);

        info!(%generation, "Monitor link open");
        Ok(generation)
    }

    /// Tears down `generation` after a failure and re-enters the reconnect
    /// loop if the link is still desired. Stale generations are ignored.
    fn link_failed(self: &Arc<Self>, generation: Generation, failure: LinkFailure) {
        let mut state = self.state.lock();
        if !state.is_current(generation) {
            trace!(%generation, error = %failure, "Ignoring failure from stale transport");
            return;
        }

        let failed = state.teardown(&failure).map_or(0, |(_, failed)| failed);
        warn!(%generation, failed, error = %failure, "Monitor link lost");

        if *self.desired.borrow() {
            let _ = self.join_flight(&mut state);
        }
    }
}

// ============================================================================
// LinkCore - Event Pump
// ============================================================================

impl LinkCore {
    /// Feeds one transport's events into the link until it terminates.
    async fn pump_events(
        self: Arc<Self>,
        generation: Generation,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Message(frame) => self.dispatch(generation, frame),
                TransportEvent::Pong => self.acknowledge(generation),
                TransportEvent::Closed { code, reason } => {
                    self.link_failed(generation, LinkFailure::Closed { code, reason });
                    return;
                }
                TransportEvent::Error(message) => {
                    self.link_failed(generation, LinkFailure::Transport(message));
                    return;
                }
            }
        }

        self.link_failed(
            generation,
            LinkFailure::Closed {
                code: None,
                reason: "event stream ended".to_string(),
            },
        );
    }

    /// Hands an inbound frame to the handler.
    ///
    /// Handler calls are issued in arrival order; their completions may
    /// land in any order. The handler runs with no lock held, so it may call
    /// back into the monitor. Frames without a correlation id reach the
    /// handler but never resolve a pending request.
    fn dispatch(self: &Arc<Self>, generation: Generation, frame: Frame) {
        let message = match InboundMessage::decode(frame) {
            Ok(message) => message,
            Err(e) => {
                warn!(%generation, error = %e, "Dropping undecodable frame");
                return;
            }
        };
        let id = message.id;

        if !self.state.lock().is_current(generation) {
            trace!(%generation, ?id, "Dropping frame from stale transport");
            return;
        }
        let Some(handler) = self.handler.current() else {
            trace!(?id, "No handler registered");
            return;
        };

        let Some(future) = handler::call(&handler, message) else {
            return;
        };

        let core = Arc::clone(self);
        tokio::spawn(async move {
            if handler::settle(id, future).await
                && let Some(id) = id
            {
                core.resolve_pending(generation, id);
            }
        });
    }

    /// Forwards a pong to the heartbeat of `generation`.
    fn acknowledge(&self, generation: Generation) {
        let state = self.state.lock();
        match state.active.as_ref() {
            Some(active) if active.generation == generation => {
                let _ = active.acks.send(());
            }
            _ => trace!(%generation, "Ignoring pong from stale transport"),
        }
    }

    /// Resolves `id` if `generation` still owns the pending table.
    fn resolve_pending(&self, generation: Generation, id: CorrelationId) {
        let mut state = self.state.lock();
        if state.is_current(generation) && state.pending.resolve(id) {
            trace!(%generation, %id, "Request resolved");
        }
    }
}

// ============================================================================
// LinkCore - Requests
// ============================================================================

impl LinkCore {
    /// Registers `id` as pending and sends `frame`.
    ///
    /// Returns the owning generation and the receiver that completes when the
    /// handler finishes `id` or the link fails.
    pub fn register(
        &self,
        id: CorrelationId,
        frame: Frame,
    ) -> Result<(Generation, oneshot::Receiver<Result<()>>)> {
        let mut state = self.state.lock();
        let (generation, transport) = match state.active.as_ref() {
            Some(active) if state.connected => (active.generation, Arc::clone(&active.transport)),
            _ => return Err(Error::NotConnected),
        };

        let (reply, reply_rx) = oneshot::channel();
        state.pending.insert(id, reply, self.options.max_pending)?;

        if let Err(e) = transport.send(frame) {
            state.pending.remove(id);
            return Err(e);
        }

        trace!(%generation, %id, "Request sent");
        Ok((generation, reply_rx))
    }

    /// Drops `id` from the pending table without completing it.
    pub fn forget(&self, generation: Generation, id: CorrelationId) -> bool {
        let mut state = self.state.lock();
        state.is_current(generation) && state.pending.remove(id)
    }

    /// Sends `frame` over the canonical transport.
    pub fn send(&self, frame: Frame) -> Result<()> {
        let transport = {
            let state = self.state.lock();
            match state.active.as_ref() {
                Some(active) if state.connected => Arc::clone(&active.transport),
                _ => return Err(Error::NotConnected),
            }
        };
        transport.send(frame)
    }
}

// ============================================================================
// LinkCore - Introspection
// ============================================================================

impl LinkCore {
    /// Returns `true` while a transport is open.
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Returns `true` between `connect` and `disconnect`.
    pub fn is_desired(&self) -> bool {
        *self.desired.borrow()
    }

    /// Returns the number of in-flight requests.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Returns the generation of the canonical transport, if any.
    pub fn generation(&self) -> Option<Generation> {
        self.state.lock().active.as_ref().map(|active| active.generation)
    }

    /// Returns the observable phase.
    pub fn link_state(&self) -> LinkState {
        let state = self.state.lock();
        if state.connected {
            LinkState::Open
        } else if state.flight.is_some() {
            LinkState::Connecting
        } else if state.latest == Generation::ZERO {
            LinkState::Idle
        } else {
            LinkState::Closed
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Completes once the link is no longer desired.
async fn until_undesired(desired: &mut watch::Receiver<bool>) {
    let _ = desired.wait_for(|desired| !*desired).await;
}

/// Normalizes resolver failures to [`Error::EndpointResolution`].
fn resolution_error(e: Error) -> Error {
    match e {
        Error::EndpointResolution { .. } => e,
        other => Error::endpoint_resolution(other.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================
