//! # Listener callbacks and registration options.
//!
//! [`EventListener`] is the callback seam: any `Fn(&Event) + Send + Sync` closure
//! implements it, and so can a struct with its own `handle_event`.
//!
//! [`Listener`] is the shared handle a caller registers. Its identity (the `Arc`
//! allocation) is what de-duplicates registrations and what
//! `remove_event_listener` matches on, so keep a clone of the handle you added.
//!
//! ## Options
//! ```text
//! once     → entry removed right before its first invocation
//! capture  → part of the identity key (type, listener, capture)
//! passive  → prevent_default() is ignored while the listener runs
//! weak     → the target only holds a Weak; the entry fires while the caller
//!            keeps the Listener alive and is pruned afterwards
//! signal   → entry removed when that AbortSignal aborts; no-op if already aborted
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use crate::abort::AbortSignal;

use super::event::Event;

/// Callback invoked for each dispatched event.
pub trait EventListener: Send + Sync + 'static {
    fn handle_event(&self, event: &Event);
}

impl<F> EventListener for F
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    fn handle_event(&self, event: &Event) {
        self(event)
    }
}

/// Shared handle to an [`EventListener`]; clones share identity.
#[derive(Clone)]
pub struct Listener(Arc<dyn EventListener>);

impl Listener {
    pub fn new<L: EventListener>(listener: L) -> Self {
        Self(Arc::new(listener))
    }

    pub fn from_arc(listener: Arc<dyn EventListener>) -> Self {
        Self(listener)
    }

    /// `true` iff both handles refer to the same listener.
    #[inline]
    pub fn ptr_eq(a: &Listener, b: &Listener) -> bool {
        a.id() == b.id()
    }

    #[inline]
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn downgrade(&self) -> WeakListener {
        WeakListener(Arc::downgrade(&self.0))
    }

    #[inline]
    pub(crate) fn call(&self, event: &Event) {
        self.0.handle_event(event)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:#x})", self.id())
    }
}

/// Non-owning listener handle used by `weak` registrations.
#[derive(Clone)]
pub(crate) struct WeakListener(Weak<dyn EventListener>);

impl WeakListener {
    pub(crate) fn upgrade(&self) -> Option<Listener> {
        self.0.upgrade().map(Listener)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

/// Options for [`EventTarget::add_event_listener`](super::EventTarget::add_event_listener).
#[derive(Clone, Debug, Default)]
pub struct AddEventListenerOptions {
    pub once: bool,
    pub capture: bool,
    pub passive: bool,
    pub weak: bool,
    pub signal: Option<AbortSignal>,
}

impl AddEventListenerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_once(mut self) -> Self {
        self.once = true;
        self
    }

    #[inline]
    pub fn with_capture(mut self) -> Self {
        self.capture = true;
        self
    }

    #[inline]
    pub fn with_passive(mut self) -> Self {
        self.passive = true;
        self
    }

    #[inline]
    pub fn with_weak(mut self) -> Self {
        self.weak = true;
        self
    }

    #[inline]
    pub fn with_signal(mut self, signal: &AbortSignal) -> Self {
        self.signal = Some(signal.clone());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_follows_the_arc() {
        let a = Listener::new(|_: &Event| {});
        let b = a.clone();
        let c = Listener::new(|_: &Event| {});
        assert!(Listener::ptr_eq(&a, &b));
        assert!(!Listener::ptr_eq(&a, &c));
    }

    #[test]
    fn test_weak_handle_dies_with_listener() {
        let a = Listener::new(|_: &Event| {});
        let weak = a.downgrade();
        assert!(weak.is_alive());
        drop(a);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_builder_sets_flags() {
        let opts = AddEventListenerOptions::new().with_once().with_capture().with_weak();
        assert!(opts.once && opts.capture && opts.weak);
        assert!(!opts.passive);
        assert!(opts.signal.is_none());
    }
}
