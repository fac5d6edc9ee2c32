//! # Process-wide retention set.
//!
//! Timeout and composite signals are referenced only weakly by their timer and
//! their sources. A caller that registers an `"abort"` listener and then drops
//! every handle still expects that listener to fire, so such signals are held
//! strongly here while they are being observed.
//!
//! ## Membership rule
//! ```text
//! retained ⇔ (timeout with pending timer || composite with a live source)
//!            && at least one non-weak "abort" listener
//!            && not aborted
//! ```
//! Re-evaluated on every add/remove of an `"abort"` listener, when a timer is
//! released, and for each dependent composite when a source signal is dropped;
//! released on abort.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

use super::signal::{AbortSignal, SignalInner};

static RETAINED: LazyLock<Mutex<HashMap<usize, AbortSignal>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

#[inline]
fn key(inner: &Arc<SignalInner>) -> usize {
    Arc::as_ptr(inner) as usize
}

/// Adds or removes `signal` according to the membership rule.
pub(crate) fn refresh(signal: &AbortSignal) {
    let keep = signal.should_retain();
    let k = key(signal.inner());
    let (retained, evicted) = {
        let mut set = RETAINED.lock();
        // An abort racing with this call either shows up here or releases
        // after this lock is dropped.
        if keep && !signal.aborted() {
            set.entry(k).or_insert_with(|| signal.clone());
            (true, None)
        } else {
            (false, set.remove(&k))
        }
    };
    if evicted.is_some() {
        tracing::trace!(signal = k, "signal released from retention");
    } else if retained {
        tracing::trace!(signal = k, "signal retained");
    }
    drop(evicted);
}

/// Unconditionally removes the signal (abort path).
pub(crate) fn release(inner: &Arc<SignalInner>) {
    let evicted = RETAINED.lock().remove(&key(inner));
    drop(evicted);
}

pub(crate) fn contains(inner: &Arc<SignalInner>) -> bool {
    RETAINED.lock().contains_key(&key(inner))
}

/// Number of signals currently held by the retention set.
pub fn retained_count() -> usize {
    RETAINED.lock().len()
}
