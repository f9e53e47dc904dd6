//! Shared fakes for the integration tests.
//!
//! Everything here runs under tokio's paused clock: open delays and
//! resolver failures advance virtual time only.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use url::Url;

use netmon_link::{
    Connector, ControlPlane, EndpointResolver, Error, Frame, Link, Monitor, MonitorBuilder,
    Result, Transport, TransportEvent,
};

// ============================================================================
// Tracing
// ============================================================================

/// Installs a test subscriber once; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Lets every runnable task make progress.
///
/// Under the paused clock the runtime only advances time once all tasks are
/// idle, so a short sleep returns after spawned work has settled.
pub async fn settle() {
    sleep(Duration::from_millis(1)).await;
}

// ============================================================================
// MockTransport
// ============================================================================

/// In-memory transport that records what the link does to it.
pub struct MockTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    sent: Mutex<Vec<Frame>>,
    pings: Mutex<Vec<Instant>>,
    closed: AtomicBool,
    auto_pong: bool,
}

impl MockTransport {
    /// Injects an event as if the remote produced it.
    pub fn push(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    /// Injects an inbound frame.
    pub fn deliver(&self, frame: Frame) {
        self.push(TransportEvent::Message(frame));
    }

    /// Injects an inbound text frame.
    pub fn deliver_text(&self, text: &str) {
        self.deliver(Frame::Text(text.to_string()));
    }

    /// Frames the link sent.
    pub fn sent(&self) -> Vec<Frame> {
        self.sent.lock().clone()
    }

    /// When each heartbeat probe went out.
    pub fn pings(&self) -> Vec<Instant> {
        self.pings.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn send(&self, frame: Frame) -> Result<()> {
        if self.is_closed() {
            return Err(Error::transport("mock transport closed"));
        }
        self.sent.lock().push(frame);
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::transport("mock transport closed"));
        }
        self.pings.lock().push(Instant::now());
        if self.auto_pong {
            self.push(TransportEvent::Pong);
        }
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// MockConnector
// ============================================================================

/// Connector handing out [`MockTransport`]s.
pub struct MockConnector {
    attempts: AtomicUsize,
    failures_left: AtomicUsize,
    open_delay: Duration,
    auto_pong: bool,
    opened: Mutex<Vec<Arc<MockTransport>>>,
}

impl MockConnector {
    /// Opens instantly; answers every heartbeat.
    pub fn new() -> Arc<Self> {
        Self::configured(0, Duration::ZERO, true)
    }

    /// Fails the first `count` attempts.
    pub fn failing(count: usize) -> Arc<Self> {
        Self::configured(count, Duration::ZERO, true)
    }

    /// Takes `delay` to open each socket.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::configured(0, delay, true)
    }

    /// Opens sockets that never answer heartbeats.
    pub fn silent() -> Arc<Self> {
        Self::configured(0, Duration::ZERO, false)
    }

    pub fn configured(failures: usize, open_delay: Duration, auto_pong: bool) -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
            open_delay,
            auto_pong,
            opened: Mutex::new(Vec::new()),
        })
    }

    /// Fails the next `count` attempts.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Number of `connect` calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Every transport opened so far, oldest first.
    pub fn opened(&self) -> Vec<Arc<MockTransport>> {
        self.opened.lock().clone()
    }

    /// The most recently opened transport.
    pub fn last(&self) -> Arc<MockTransport> {
        self.opened
            .lock()
            .last()
            .cloned()
            .expect("no transport opened yet")
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _endpoint: &Url) -> Result<Link> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if !self.open_delay.is_zero() {
            sleep(self.open_delay).await;
        }
        let refused = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            return Err(Error::transport("connection refused"));
        }

        let (events, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(MockTransport {
            events,
            sent: Mutex::new(Vec::new()),
            pings: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            auto_pong: self.auto_pong,
        });
        self.opened.lock().push(Arc::clone(&transport));

        Ok(Link {
            transport,
            events: rx,
        })
    }
}

// ============================================================================
// FlakyResolver
// ============================================================================

/// Resolver that fails a fixed number of times before answering.
pub struct FlakyResolver {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyResolver {
    pub fn new() -> Arc<Self> {
        Self::failing(0)
    }

    pub fn failing(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EndpointResolver for FlakyResolver {
    async fn resolve_endpoint(&self) -> Result<Url> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(Error::endpoint_resolution("service lookup returned 503"));
        }
        Ok(Url::parse("wss://monitor.test/netmon")?)
    }
}

// ============================================================================
// RecordingControlPlane
// ============================================================================

/// Control plane that records every path it is asked to post.
pub struct RecordingControlPlane {
    paths: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingControlPlane {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            paths: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            paths: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }
}

#[async_trait]
impl ControlPlane for RecordingControlPlane {
    async fn post(&self, path: &str) -> Result<()> {
        self.paths.lock().push(path.to_string());
        if self.fail {
            return Err(Error::control_plane("500 Internal Server Error"));
        }
        Ok(())
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Builder wired to the given fakes.
pub fn builder(resolver: &Arc<FlakyResolver>, connector: &Arc<MockConnector>) -> MonitorBuilder {
    init_tracing();
    Monitor::builder()
        .resolver_arc(Arc::clone(resolver) as Arc<dyn EndpointResolver>)
        .connector_arc(Arc::clone(connector) as Arc<dyn Connector>)
}

/// Monitor wired to the given connector and a resolver that always answers.
pub fn monitor(connector: &Arc<MockConnector>) -> Monitor {
    builder(&FlakyResolver::new(), connector)
        .build()
        .expect("monitor should build")
}
