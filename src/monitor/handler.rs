//! Message handler slot.
//!
//! A monitor has at most one handler; setting a new one replaces the old.
//! The handler's answer decides whether the message's correlation id is
//! finished: `Ok(true)` resolves the pending request, `Ok(false)` leaves it
//! open for further frames.

// ============================================================================
// Imports
// ============================================================================

use std::error::Error as StdError;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tracing::warn;

use crate::identifiers::CorrelationId;
use crate::protocol::InboundMessage;

// ============================================================================
// Types
// ============================================================================

/// Error a handler may return. Logged, never propagated.
pub type HandlerError = Box<dyn StdError + Send + Sync>;

/// What a handler resolves to: `true` when the id is finished.
pub type HandlerResult = Result<bool, HandlerError>;

/// Boxed handler future.
pub(crate) type HandlerFuture = BoxFuture<'static, HandlerResult>;

/// Type-erased handler.
pub(crate) type MessageHandler = Arc<dyn Fn(InboundMessage) -> HandlerFuture + Send + Sync>;

// ============================================================================
// HandlerSlot
// ============================================================================

/// Last-writer-wins slot holding the current handler.
#[derive(Default)]
pub(crate) struct HandlerSlot {
    slot: Mutex<Option<MessageHandler>>,
}

impl HandlerSlot {
    /// Replaces the handler.
    pub fn set<F, Fut>(&self, handler: F)
    where
        F: Fn(InboundMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let handler: MessageHandler = Arc::new(move |message| handler(message).boxed());
        *self.slot.lock() = Some(handler);
    }

    /// Removes the handler.
    pub fn clear(&self) {
        *self.slot.lock() = None;
    }

    /// Returns `true` if a handler is registered.
    pub fn is_set(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Returns the current handler.
    pub fn current(&self) -> Option<MessageHandler> {
        self.slot.lock().clone()
    }
}

// ============================================================================
// Invocation
// ============================================================================

/// Calls the handler, catching a panic in the synchronous part.
pub(crate) fn call(handler: &MessageHandler, message: InboundMessage) -> Option<HandlerFuture> {
    let id = message.id;
    match panic::catch_unwind(AssertUnwindSafe(|| handler(message))) {
        Ok(future) => Some(future),
        Err(_) => {
            warn!(?id, "Message handler panicked");
            None
        }
    }
}

/// Drives a handler future to completion, isolating errors and panics.
///
/// Returns `true` only if the handler reported the id finished.
pub(crate) async fn settle(id: Option<CorrelationId>, future: HandlerFuture) -> bool {
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(done)) => done,
        Ok(Err(e)) => {
            warn!(?id, error = %e, "Message handler failed");
            false
        }
        Err(_) => {
            warn!(?id, "Message handler panicked");
            false
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
