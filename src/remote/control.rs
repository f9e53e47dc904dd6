//! Control-plane seam and instance addressing.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::identifiers::{InstanceId, ProjectId};

// ============================================================================
// ControlPlane
// ============================================================================

/// Authenticated HTTP access to the control-plane API.
///
/// The link only needs to know whether a call succeeded; response bodies are
/// ignored.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Issues `POST {api_root}/{path}`.
    ///
    /// # Errors
    ///
    /// Implementations should return [`crate::Error::ControlPlane`] on
    /// non-success responses.
    async fn post(&self, path: &str) -> Result<()>;
}

// ============================================================================
// CaptureAction
// ============================================================================

/// Remote capture toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureAction {
    /// Start intercepting traffic on the instance.
    Enable,
    /// Stop intercepting traffic on the instance.
    Disable,
}

impl CaptureAction {
    /// Returns the path segment for this action.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }
}

// ============================================================================
// Instance
// ============================================================================

/// The remote instance being monitored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instance {
    project: ProjectId,
    id: InstanceId,
}

impl Instance {
    /// Creates an instance reference.
    #[inline]
    #[must_use]
    pub fn new(project: impl Into<ProjectId>, id: impl Into<InstanceId>) -> Self {
        Self {
            project: project.into(),
            id: id.into(),
        }
    }

    /// Returns the owning project.
    #[inline]
    #[must_use]
    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Returns the instance id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    /// Returns the control-plane path for a capture toggle.
    ///
    /// Format: `v1/instances/{id}/sslsplit/{enable|disable}`
    #[must_use]
    pub fn capture_path(&self, action: CaptureAction) -> String {
        format!("v1/instances/{}/sslsplit/{}", self.id, action.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
