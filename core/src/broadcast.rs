//! Fan-out broadcaster for session events.
//!
//! Pushes each [`SessionEvent`] to every currently connected viewer channel.
//! Delivery is best-effort: at most once per channel, no retry, no backlog
//! for a channel that is slow or gone. A subscriber that falls behind the
//! channel capacity loses the oldest events (`RecvError::Lagged`) and is
//! expected to reconcile from the session snapshot, not from replay.
//!
//! Built on [`tokio::sync::broadcast`]: sends never block, and a dead or
//! slow receiver cannot stall delivery to the rest.

use crate::event::SessionEvent;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default capacity of the broadcast channel per subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// Broadcasts session events to all connected viewers.
///
/// Cheap to clone; clones share the same channel.
#[derive(Clone, Debug)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Create a broadcaster with the given per-subscriber capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe a new viewer channel.
    ///
    /// The receiver only observes events emitted after this call; earlier
    /// events are gone by design.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Push an event to every connected viewer.
    ///
    /// Never fails and never blocks. With no viewers connected the event is
    /// simply dropped.
    pub fn broadcast(&self, event: &SessionEvent) {
        match self.tx.send(event.clone()) {
            Ok(receivers) => {
                trace!(?event, receivers, "broadcast session event");
            }
            Err(_) => {
                // No receivers; nothing to deliver.
                debug!(?event, "broadcast with no connected viewers");
            }
        }
    }

    /// Number of currently connected viewer channels.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
