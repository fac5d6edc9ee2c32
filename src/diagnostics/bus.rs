//! # Broadcast bus for diagnostics.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking publishing from synchronous code (dispatch loops, registry
//! updates) to any number of asynchronous consumers.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                      Consumers (many):
//!   dispatch loop  ──┐
//!   listener adds  ──┼──────► Bus ───────► diagnostics::subscribe() receivers
//!   SubscriberSet  ──┘  (broadcast chan)   SubscriberSet::listen() forwarder
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and needs no runtime.
//! - **Bounded capacity**: a single ring buffer stores recent items for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: items are lost if nobody is subscribed at send time.

use tokio::sync::broadcast;

use super::diagnostic::Diagnostic;

/// Broadcast channel for diagnostics.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Diagnostic>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Diagnostic>(capacity);
        Self { tx }
    }

    /// Publishes a diagnostic to all active receivers.
    ///
    /// If there are no receivers, the item is dropped.
    pub fn publish(&self, d: Diagnostic) {
        let _ = self.tx.send(d);
    }

    /// Creates a new receiver that observes subsequently published items.
    pub fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let bus = Bus::new(0);
        bus.publish(Diagnostic::new(DiagnosticKind::ListenerPanicked));
        assert_eq!(bus.receiver_count(), 0);
    }

    #[test]
    fn test_receiver_sees_items_after_subscribe() {
        let bus = Bus::new(4);
        let mut rx = bus.subscribe();
        bus.publish(Diagnostic::listener_panicked("x", "boom".into()));
        let got = rx.try_recv().expect("item");
        assert_eq!(got.kind, DiagnosticKind::ListenerPanicked);
    }
}
