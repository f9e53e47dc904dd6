//! External collaborators.
//!
//! The link does not know how the monitor endpoint is discovered or how the
//! control-plane API is called. Callers plug those in through the traits
//! here.
//!
//! | Seam | Used for |
//! |------|----------|
//! | [`EndpointResolver`] | Finding the socket URL before every open attempt |
//! | [`ControlPlane`] | Enabling/disabling capture on the instance |
//! | [`Instance`] | The project/instance pair control paths are built from |

// ============================================================================
// Submodules
// ============================================================================

/// Control-plane seam and instance addressing.
pub mod control;

/// Endpoint resolution seam.
pub mod resolver;

// ============================================================================
// Re-exports
// ============================================================================

pub use control::{CaptureAction, ControlPlane, Instance};
pub use resolver::{EndpointResolver, StaticResolver};
