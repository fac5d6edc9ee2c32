//! # Non-blocking fan-out of diagnostics to subscribers.
//!
//! [`SubscriberSet`] delivers diagnostics to several [`Subscribe`]
//! implementations concurrently without blocking whoever reports them.
//!
//! ## Architecture
//! ```text
//! process Bus ──► listen() forwarder ──► emit(d)
//!                                          │
//!                                          ├──► [queue 1] ──► worker 1 ──► sub1.on_diagnostic()
//!                                          │    (bounded)         └──────► panic → SubscriberPanicked
//!                                          └──► [queue N] ──► worker N ──► subN.on_diagnostic()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` uses `try_send` and returns immediately.
//! - **Overflow**: the item is dropped for that subscriber only and
//!   `SubscriberOverflow` is published (never for overflow items themselves).
//! - **Isolation**: a slow or panicking subscriber does not affect others.
//! - **No feedback**: a report about a subscriber is never delivered to that
//!   subscriber, and a panic while handling such a report is only logged.
//! - **Per-subscriber FIFO**; no ordering across subscribers.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::diagnostics::{self, Bus, Diagnostic};
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Diagnostic>>,
}

struct Forwarder {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Fan-out coordinator for diagnostics subscribers.
pub struct SubscriberSet {
    channels: Arc<Vec<SubscriberChannel>>,
    workers: Vec<JoinHandle<()>>,
    forwarder: Option<Forwarder>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a set attached to the process diagnostics bus.
    ///
    /// Must be called inside a tokio runtime (workers are spawned immediately).
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self::with_bus(subs, diagnostics::bus().clone())
    }

    /// Creates a set that reports overflow/panics on `bus` and listens to it.
    #[must_use]
    pub fn with_bus(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Diagnostic>>(cap);
            let bus_for_worker = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(d) = rx.recv().await {
                    let fut = sub.on_diagnostic(d.as_ref());
                    if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = diagnostics::panic_message(&*payload);
                        tracing::warn!(subscriber = sub.name(), panic = %info, "diagnostics subscriber panicked");
                        if !is_about_subscriber(&d) {
                            bus_for_worker.publish(Diagnostic::subscriber_panicked(sub.name(), info));
                        }
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            channels: Arc::new(channels),
            workers,
            forwarder: None,
            bus,
        }
    }

    /// Emits a diagnostic to all subscribers (clones it once).
    pub fn emit(&self, d: &Diagnostic) {
        self.emit_arc(Arc::new(d.clone()));
    }

    /// Emits a pre-allocated diagnostic to all subscribers.
    pub fn emit_arc(&self, d: Arc<Diagnostic>) {
        fan_out(&self.channels, &self.bus, d);
    }

    /// Starts forwarding everything published on the bus into this set.
    ///
    /// Idempotent; the forwarder stops on [`shutdown`](Self::shutdown).
    pub fn listen(&mut self) {
        if self.forwarder.is_some() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let token = CancellationToken::new();
        let stop = token.clone();
        let channels = Arc::clone(&self.channels);
        let bus = self.bus.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(d) => fan_out(&channels, &bus, Arc::new(d)),
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "diagnostics forwarder lagged");
                            continue;
                        }
                    }
                }
            }
        });
        self.forwarder = Some(Forwarder { token, handle });
    }

    /// Number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Stops the forwarder, closes every queue, and waits for workers to drain.
    pub async fn shutdown(self) {
        if let Some(f) = self.forwarder {
            f.token.cancel();
            let _ = f.handle.await;
        }
        drop(self.channels);

        for h in self.workers {
            let _ = h.await;
        }
    }
}

fn is_about_subscriber(d: &Diagnostic) -> bool {
    d.is_subscriber_panic() || d.is_subscriber_overflow()
}

fn fan_out(channels: &[SubscriberChannel], bus: &Bus, d: Arc<Diagnostic>) {
    let is_overflow = d.is_subscriber_overflow();
    let about = if is_about_subscriber(&d) { d.source.as_deref() } else { None };

    for channel in channels {
        if about == Some(channel.name) {
            continue;
        }
        let reason = match channel.sender.try_send(Arc::clone(&d)) {
            Ok(()) => continue,
            Err(mpsc::error::TrySendError::Full(_)) => "full",
            Err(mpsc::error::TrySendError::Closed(_)) => "closed",
        };
        if !is_overflow {
            tracing::warn!(subscriber = channel.name, reason, "diagnostic dropped for subscriber");
            bus.publish(Diagnostic::subscriber_overflow(channel.name, reason));
        }
    }
}
