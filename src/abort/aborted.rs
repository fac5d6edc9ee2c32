//! # Awaiting an abort.
//!
//! [`aborted`] turns a signal into a future. The bridge listener is weak and
//! resists `stop_immediate_propagation`, so awaiting never keeps the signal
//! alive and other listeners cannot suppress it. The future owns the bridge:
//! dropping it retires the signal-side entry.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::events::{Event, InternalFlags, Listener, ABORT};

use super::signal::AbortSignal;

type Notify = Arc<Mutex<Option<oneshot::Sender<()>>>>;

fn notify(tx: &Notify) {
    if let Some(tx) = tx.lock().take() {
        let _ = tx.send(());
    }
}

/// Resolves once `signal` aborts; immediately if it already has.
///
/// If the signal is dropped while pending the future never resolves.
pub fn aborted(signal: &AbortSignal) -> impl Future<Output = ()> + Send + 'static {
    let (tx, rx) = oneshot::channel::<()>();
    let tx: Notify = Arc::new(Mutex::new(Some(tx)));

    let bridge = (!signal.aborted()).then(|| {
        let tx = Arc::clone(&tx);
        let bridge = Listener::new(move |_: &Event| notify(&tx));
        signal.add_internal(
            ABORT,
            &bridge,
            InternalFlags {
                once: true,
                weak: true,
                resist_stop_propagation: true,
            },
        );
        bridge
    });
    // Covers an abort that landed before the bridge was registered.
    if signal.aborted() {
        notify(&tx);
    }

    async move {
        let _bridge = bridge;
        let _ = rx.await;
    }
}
