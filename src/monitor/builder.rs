//! Builder pattern for monitor configuration.
//!
//! # Example
//!
//! ```no_run
//! use netmon_link::{Monitor, MonitorOptions};
//!
//! # fn example() -> netmon_link::Result<()> {
//! let monitor = Monitor::builder()
//!     .endpoint_str("ws://127.0.0.1:9000/netmon")?
//!     .options(MonitorOptions::new().with_max_pending(32))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::{Error, Result};
use crate::remote::{ControlPlane, EndpointResolver, Instance, StaticResolver};
use crate::transport::{Connector, WebSocketConnector};

use super::core::{CaptureControl, Monitor};
use super::link::LinkCore;
use super::options::MonitorOptions;

// ============================================================================
// MonitorBuilder
// ============================================================================

/// Builder for configuring a [`Monitor`].
///
/// Use [`Monitor::builder()`] to create a new builder.
#[derive(Default)]
pub struct MonitorBuilder {
    /// Supplies the socket URL per attempt.
    resolver: Option<Arc<dyn EndpointResolver>>,
    /// Opens sockets. Defaults to [`WebSocketConnector`].
    connector: Option<Arc<dyn Connector>>,
    /// Control-plane access for capture toggles.
    control_plane: Option<Arc<dyn ControlPlane>>,
    /// Instance the capture toggles address.
    instance: Option<Instance>,
    /// Timing and capacity.
    options: MonitorOptions,
}

impl fmt::Debug for MonitorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorBuilder")
            .field("resolver", &self.resolver.is_some())
            .field("connector", &self.connector.is_some())
            .field("control_plane", &self.control_plane.is_some())
            .field("instance", &self.instance)
            .field("options", &self.options)
            .finish()
    }
}

// ============================================================================
// MonitorBuilder Implementation
// ============================================================================

impl MonitorBuilder {
    /// Creates a builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint resolver.
    #[inline]
    #[must_use]
    pub fn resolver(self, resolver: impl EndpointResolver + 'static) -> Self {
        self.resolver_arc(Arc::new(resolver))
    }

    /// Sets a shared endpoint resolver.
    #[inline]
    #[must_use]
    pub fn resolver_arc(mut self, resolver: Arc<dyn EndpointResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Uses a fixed endpoint instead of a resolver.
    #[inline]
    #[must_use]
    pub fn endpoint(self, endpoint: Url) -> Self {
        self.resolver(StaticResolver::new(endpoint))
    }

    /// Parses and uses a fixed endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if `endpoint` is not a valid URL.
    pub fn endpoint_str(self, endpoint: &str) -> Result<Self> {
        Ok(self.endpoint(Url::parse(endpoint)?))
    }

    /// Sets the socket connector.
    #[inline]
    #[must_use]
    pub fn connector(self, connector: impl Connector + 'static) -> Self {
        self.connector_arc(Arc::new(connector))
    }

    /// Sets a shared socket connector.
    #[inline]
    #[must_use]
    pub fn connector_arc(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Sets the control plane used by `start`/`stop`.
    #[inline]
    #[must_use]
    pub fn control_plane(self, control_plane: impl ControlPlane + 'static) -> Self {
        self.control_plane_arc(Arc::new(control_plane))
    }

    /// Sets a shared control plane.
    #[inline]
    #[must_use]
    pub fn control_plane_arc(mut self, control_plane: Arc<dyn ControlPlane>) -> Self {
        self.control_plane = Some(control_plane);
        self
    }

    /// Sets the instance whose capture `start`/`stop` toggle.
    #[inline]
    #[must_use]
    pub fn instance(mut self, instance: Instance) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Sets timing and capacity options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: MonitorOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the monitor with validation.
    ///
    /// The monitor starts idle; nothing connects until asked.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no resolver or endpoint is set
    /// - [`Error::Config`] if only one of control plane / instance is set
    /// - [`Error::Config`] if the options are invalid
    pub fn build(self) -> Result<Monitor> {
        self.options.validate()?;

        let resolver = self.resolver.ok_or_else(|| {
            Error::config(
                "An endpoint resolver is required. Use .resolver() or .endpoint() to set it.",
            )
        })?;

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WebSocketConnector::new()));

        let capture = match (self.control_plane, self.instance) {
            (Some(plane), Some(instance)) => Some(Arc::new(CaptureControl { plane, instance })),
            (None, None) => None,
            (Some(_), None) => {
                return Err(Error::config(
                    "A control plane was set without an instance. Use .instance() to set it.",
                ));
            }
            (None, Some(_)) => {
                return Err(Error::config(
                    "An instance was set without a control plane. Use .control_plane() to set it.",
                ));
            }
        };

        Ok(Monitor {
            link: Arc::new(LinkCore::new(resolver, connector, self.options)),
            capture,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
