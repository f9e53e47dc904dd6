//! Endpoint resolution.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

// ============================================================================
// EndpointResolver
// ============================================================================

/// Supplies the socket URL for the next open attempt.
///
/// Called once per attempt, so implementations may return a different URL
/// each time (e.g. a freshly signed one).
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    /// Resolves the monitor endpoint.
    ///
    /// # Errors
    ///
    /// Any error is treated as a failed attempt and retried after backoff.
    async fn resolve_endpoint(&self) -> Result<Url>;
}

// ============================================================================
// StaticResolver
// ============================================================================

/// Resolver that always returns the same URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticResolver {
    endpoint: Url,
}

impl StaticResolver {
    /// Creates a resolver for a known endpoint.
    #[inline]
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }

    /// Parses `endpoint` and creates a resolver for it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Url`] if `endpoint` is not a valid URL.
    pub fn parse(endpoint: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(endpoint)?))
    }
}

#[async_trait]
impl EndpointResolver for StaticResolver {
    async fn resolve_endpoint(&self) -> Result<Url> {
        Ok(self.endpoint.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
