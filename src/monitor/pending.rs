//! Pending-request table.
//!
//! Maps correlation ids to the channel that completes the caller's request.
//! The table belongs to one transport: when that transport goes away every
//! entry is failed once and the table starts empty for the next one.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::identifiers::CorrelationId;

// ============================================================================
// Types
// ============================================================================

/// Completes one pending request.
pub(crate) type ReplySender = oneshot::Sender<Result<()>>;

// ============================================================================
// PendingTable
// ============================================================================

/// In-flight requests awaiting their final reply.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    entries: FxHashMap<CorrelationId, ReplySender>,
}

impl PendingTable {
    /// Returns the number of in-flight requests.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is in flight.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if `id` is already in flight or the table
    /// already holds `max` entries.
    pub fn insert(&mut self, id: CorrelationId, reply: ReplySender, max: usize) -> Result<()> {
        if self.entries.contains_key(&id) {
            return Err(Error::protocol(format!("correlation id {id} is already pending")));
        }
        if self.entries.len() >= max {
            return Err(Error::protocol(format!(
                "Too many pending requests: {}/{max}",
                self.entries.len()
            )));
        }

        self.entries.insert(id, reply);
        Ok(())
    }

    /// Completes `id` successfully. Returns `false` if it was not pending.
    pub fn resolve(&mut self, id: CorrelationId) -> bool {
        match self.entries.remove(&id) {
            Some(reply) => {
                let _ = reply.send(Ok(()));
                true
            }
            None => false,
        }
    }

    /// Drops `id` without completing it. Returns `false` if it was not pending.
    pub fn remove(&mut self, id: CorrelationId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Fails every entry with an error from `cause` and empties the table.
    ///
    /// Returns how many entries were failed.
    pub fn fail_all(&mut self, cause: impl Fn() -> Error) -> usize {
        let count = self.entries.len();
        for (_, reply) in self.entries.drain() {
            let _ = reply.send(Err(cause()));
        }
        count
    }
}

// ============================================================================
// Tests
// ============================================================================
