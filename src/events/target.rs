//! # Listener registry and dispatch.
//!
//! [`EventTarget`] keeps, per event type, an ordered list of listener entries
//! and runs them synchronously on [`dispatch_event`](EventTarget::dispatch_event).
//!
//! ## Architecture
//! ```text
//! add_event_listener(type, listener, opts)
//!     ├─► dedup on (type, listener identity, capture)
//!     ├─► append entry (strong or Weak callback)
//!     ├─► max-listeners check ──► diagnostics (once per target)
//!     └─► opts.signal: internal once-listener on the signal removes the entry
//!                      (owned by the entry; the signal only holds a Weak)
//!
//! dispatch_event(event)
//!     ├─► begin_dispatch (EventRecursion if already dispatching)
//!     ├─► snapshot entries for event.type (registry lock released)
//!     ├─► for each entry:
//!     │     removed? skip │ immediate stop? skip unless resisting
//!     │     dead weak? prune │ once? remove first
//!     │     invoke (catch_unwind) ──► panic → diagnostics, continue
//!     └─► end_dispatch, return !(cancelable && default_prevented)
//! ```
//!
//! ## Rules
//! - Insertion order is invocation order.
//! - Entries added during a dispatch do not run in that dispatch; entries
//!   removed before they are reached do not run either.
//! - The registry lock is never held while a listener runs, so listeners may
//!   freely add, remove and dispatch on the same target.
//! - For targets owned by an [`AbortSignal`](crate::AbortSignal), every change
//!   to the `"abort"` listeners re-evaluates the signal's retention.
//! - Internal registrations are weak: once whoever owns the callback lets go,
//!   the entry is dead and pruned on the next insert.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::abort::{retention, AbortSignal, SignalInner};
use crate::config::{default_max_listeners, MaxListeners};
use crate::diagnostics::{self, Diagnostic};
use crate::error::Error;

use super::event::Event;
use super::listener::{AddEventListenerOptions, Listener, WeakListener};

/// Event type whose listeners drive signal retention.
pub(crate) const ABORT: &str = "abort";

/// Listener flags for crate-internal registrations.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct InternalFlags {
    pub once: bool,
    /// Does not count toward retention.
    pub weak: bool,
    /// Runs even after `stop_immediate_propagation`.
    pub resist_stop_propagation: bool,
}

/// Current value of a handler property (`onabort`-style slot).
struct HandlerSlot {
    handler: Mutex<Listener>,
}

enum Callback {
    Strong(Listener),
    Weak(WeakListener),
    Handler(Arc<HandlerSlot>),
}

struct Entry {
    callback: Callback,
    /// Signal-side remover of a `signal`-bound entry; dies with the entry.
    remover: Option<Listener>,
    id: usize,
    once: bool,
    capture: bool,
    passive: bool,
    weak: bool,
    resist_stop_propagation: bool,
    removed: AtomicBool,
}

impl Entry {
    fn resolve(&self) -> Option<Listener> {
        match &self.callback {
            Callback::Strong(l) => Some(l.clone()),
            Callback::Weak(w) => w.upgrade(),
            Callback::Handler(slot) => Some(slot.handler.lock().clone()),
        }
    }

    fn is_alive(&self) -> bool {
        match &self.callback {
            Callback::Weak(w) => w.is_alive(),
            _ => true,
        }
    }

    #[inline]
    fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    #[inline]
    fn mark_removed(&self) {
        self.removed.store(true, Ordering::Release);
    }
}

#[derive(Default)]
struct Registry {
    listeners: HashMap<String, Vec<Arc<Entry>>>,
    handlers: HashMap<String, Arc<HandlerSlot>>,
    max_listeners: Option<MaxListeners>,
    warned: bool,
}

impl Registry {
    /// Drops entries whose weak callback is gone; returns them for dropping outside the lock.
    fn prune(&mut self, event_type: &str) -> Vec<Arc<Entry>> {
        let Some(list) = self.listeners.get_mut(event_type) else {
            return Vec::new();
        };
        let mut dead = Vec::new();
        list.retain(|e| {
            if e.is_alive() {
                true
            } else {
                e.mark_removed();
                dead.push(Arc::clone(e));
                false
            }
        });
        if list.is_empty() {
            self.listeners.remove(event_type);
        }
        dead
    }

    fn take(&mut self, event_type: &str, pred: impl Fn(&Entry) -> bool) -> Option<Arc<Entry>> {
        let list = self.listeners.get_mut(event_type)?;
        let pos = list.iter().position(|e| pred(Arc::as_ref(e)))?;
        let entry = list.remove(pos);
        entry.mark_removed();
        if list.is_empty() {
            self.listeners.remove(event_type);
        }
        Some(entry)
    }

    fn threshold(&self) -> MaxListeners {
        self.max_listeners.unwrap_or_else(default_max_listeners)
    }
}

pub(crate) struct TargetInner {
    registry: Mutex<Registry>,
    owner: Option<Weak<SignalInner>>,
}

/// Listener registry with synchronous, ordered dispatch.
///
/// Cloning is cheap and yields a handle to the same target.
#[derive(Clone)]
pub struct EventTarget {
    inner: Arc<TargetInner>,
}

impl Default for EventTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl EventTarget {
    pub fn new() -> Self {
        Self::with_owner(None)
    }

    pub(crate) fn for_signal(owner: Weak<SignalInner>) -> Self {
        Self::with_owner(Some(owner))
    }

    fn with_owner(owner: Option<Weak<SignalInner>>) -> Self {
        Self {
            inner: Arc::new(TargetInner {
                registry: Mutex::new(Registry::default()),
                owner,
            }),
        }
    }

    /// `true` iff both handles refer to the same target.
    #[inline]
    pub fn ptr_eq(a: &EventTarget, b: &EventTarget) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// The signal owning this target, if it belongs to a live one.
    pub(crate) fn owner(&self) -> Option<Arc<SignalInner>> {
        self.inner.owner.as_ref().and_then(Weak::upgrade)
    }

    /// Registers `listener` for `event_type`.
    ///
    /// No-op if the same `(event_type, listener, capture)` is already registered,
    /// or if `options.signal` is already aborted.
    pub fn add_event_listener(
        &self,
        event_type: &str,
        listener: &Listener,
        options: AddEventListenerOptions,
    ) {
        if options.signal.as_ref().is_some_and(AbortSignal::aborted) {
            return;
        }

        let callback = if options.weak {
            Callback::Weak(listener.downgrade())
        } else {
            Callback::Strong(listener.clone())
        };
        let target = Arc::downgrade(&self.inner);
        let entry = Arc::new_cyclic(|registered: &Weak<Entry>| Entry {
            callback,
            remover: options
                .signal
                .as_ref()
                .map(|_| remover(target, registered.clone(), event_type)),
            id: listener.id(),
            once: options.once,
            capture: options.capture,
            passive: options.passive,
            weak: options.weak,
            resist_stop_propagation: false,
            removed: AtomicBool::new(false),
        });

        if !self.insert(event_type, Arc::clone(&entry)) {
            return;
        }

        if let (Some(signal), Some(remover)) = (&options.signal, &entry.remover) {
            signal.add_internal(
                ABORT,
                remover,
                InternalFlags {
                    once: true,
                    weak: true,
                    resist_stop_propagation: true,
                },
            );
            // The signal may have aborted before the remover was registered.
            if signal.aborted() {
                self.remove_entry(event_type, &entry);
            }
        }
    }

    /// Registers a crate-internal listener with flags user code cannot set.
    ///
    /// Only a `Weak` is kept: the caller owns `listener`, and dropping it
    /// retires the entry.
    pub(crate) fn add_internal(&self, event_type: &str, listener: &Listener, flags: InternalFlags) {
        let entry = Arc::new(Entry {
            callback: Callback::Weak(listener.downgrade()),
            remover: None,
            id: listener.id(),
            once: flags.once,
            capture: false,
            passive: false,
            weak: flags.weak,
            resist_stop_propagation: flags.resist_stop_propagation,
            removed: AtomicBool::new(false),
        });
        self.insert(event_type, entry);
    }

    /// Appends `entry` unless its key is taken; returns whether it was added.
    fn insert(&self, event_type: &str, entry: Arc<Entry>) -> bool {
        let (dead, warning) = {
            let mut reg = self.inner.registry.lock();
            let dead = reg.prune(event_type);

            let list = reg.listeners.entry(event_type.to_string()).or_default();
            if list
                .iter()
                .any(|e| e.id == entry.id && e.capture == entry.capture)
            {
                return false;
            }
            list.push(entry);
            let count = list.len();

            let max = reg.threshold();
            let warning = if !reg.warned && max.is_exceeded_by(count) {
                reg.warned = true;
                Some(Diagnostic::max_listeners_exceeded(
                    event_type,
                    count,
                    max.limit().unwrap_or(usize::MAX),
                ))
            } else {
                None
            };
            (dead, warning)
        };
        drop(dead);

        if let Some(d) = warning {
            diagnostics::report(d);
        }
        self.listeners_changed(event_type);
        true
    }

    /// Removes the registration keyed by `(event_type, listener, capture)`; no-op when absent.
    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener, capture: bool) {
        let id = listener.id();
        let removed = self
            .inner
            .registry
            .lock()
            .take(event_type, |e| e.id == id && e.capture == capture);
        if removed.is_some() {
            drop(removed);
            self.listeners_changed(event_type);
        }
    }

    /// Removes one specific entry (used by `once` and by signal-bound removal).
    fn remove_entry(&self, event_type: &str, entry: &Arc<Entry>) {
        if entry.is_removed() {
            return;
        }
        let removed = self
            .inner
            .registry
            .lock()
            .take(event_type, |e| std::ptr::eq(e, Arc::as_ptr(entry)));
        if removed.is_some() {
            drop(removed);
            self.listeners_changed(event_type);
        }
    }

    /// Dispatches `event` to this target's listeners for `event.event_type()`.
    ///
    /// Returns `false` iff the event is cancelable and a non-passive listener
    /// called `prevent_default`.
    ///
    /// ### Errors
    /// [`Error::EventRecursion`] if `event` is already being dispatched.
    pub fn dispatch_event(&self, event: &Event) -> Result<bool, Error> {
        event.begin_dispatch(self)?;
        let event_type = event.event_type();

        let snapshot: Vec<Arc<Entry>> = self
            .inner
            .registry
            .lock()
            .listeners
            .get(event_type)
            .cloned()
            .unwrap_or_default();

        for entry in snapshot {
            if entry.is_removed() {
                continue;
            }
            if event.immediate_propagation_stopped() && !entry.resist_stop_propagation {
                continue;
            }
            let Some(callback) = entry.resolve() else {
                self.remove_entry(event_type, &entry);
                continue;
            };
            if entry.once {
                self.remove_entry(event_type, &entry);
            }

            event.set_in_passive_listener(entry.passive);
            let outcome = catch_unwind(AssertUnwindSafe(|| callback.call(event)));
            event.set_in_passive_listener(false);

            if let Err(payload) = outcome {
                diagnostics::report(Diagnostic::listener_panicked(
                    event_type,
                    diagnostics::panic_message(&*payload),
                ));
            }
        }

        event.end_dispatch();
        Ok(!(event.cancelable() && event.default_prevented()))
    }

    /// Assigns the handler property for `event_type` (`None` clears it).
    ///
    /// The first assignment appends one entry; later assignments replace the
    /// callback in place, keeping its position.
    pub fn set_event_handler(&self, event_type: &str, handler: Option<Listener>) {
        let existing = self.inner.registry.lock().handlers.get(event_type).cloned();
        match (existing, handler) {
            (Some(slot), Some(handler)) => {
                *slot.handler.lock() = handler;
            }
            (None, Some(handler)) => {
                let slot = Arc::new(HandlerSlot {
                    handler: Mutex::new(handler),
                });
                let entry = Arc::new(Entry {
                    id: Arc::as_ptr(&slot) as usize,
                    callback: Callback::Handler(Arc::clone(&slot)),
                    remover: None,
                    once: false,
                    capture: false,
                    passive: false,
                    weak: false,
                    resist_stop_propagation: false,
                    removed: AtomicBool::new(false),
                });
                self.inner
                    .registry
                    .lock()
                    .handlers
                    .insert(event_type.to_string(), slot);
                self.insert(event_type, entry);
            }
            (Some(slot), None) => {
                let id = Arc::as_ptr(&slot) as usize;
                let removed = {
                    let mut reg = self.inner.registry.lock();
                    reg.handlers.remove(event_type);
                    reg.take(event_type, |e| e.id == id)
                };
                if removed.is_some() {
                    drop(removed);
                    self.listeners_changed(event_type);
                }
            }
            (None, None) => {}
        }
    }

    /// Current handler property for `event_type`.
    pub fn event_handler(&self, event_type: &str) -> Option<Listener> {
        let slot = self.inner.registry.lock().handlers.get(event_type).cloned()?;
        let handler = slot.handler.lock().clone();
        Some(handler)
    }

    /// Overrides the listener threshold for this target and re-arms its warning.
    pub fn set_max_listeners(&self, max: MaxListeners) {
        let mut reg = self.inner.registry.lock();
        reg.max_listeners = Some(max);
        reg.warned = false;
    }

    /// Effective threshold: the override, else the process default.
    pub fn max_listeners(&self) -> MaxListeners {
        self.inner.registry.lock().threshold()
    }

    /// Number of live registrations for `event_type` (handler slot included).
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.count(event_type, |_| true)
    }

    /// Live registrations for `event_type` that keep an owning signal retained.
    pub(crate) fn retaining_listener_count(&self, event_type: &str) -> usize {
        self.count(event_type, |e| !e.weak)
    }

    /// Raw entries stored for `event_type`, dead or not.
    #[cfg(test)]
    pub(crate) fn entry_count(&self, event_type: &str) -> usize {
        self.inner
            .registry
            .lock()
            .listeners
            .get(event_type)
            .map_or(0, Vec::len)
    }

    fn count(&self, event_type: &str, pred: impl Fn(&Entry) -> bool) -> usize {
        self.inner
            .registry
            .lock()
            .listeners
            .get(event_type)
            .map_or(0, |list| {
                list.iter()
                    .filter(|e| !e.is_removed() && e.is_alive() && pred(Arc::as_ref(e)))
                    .count()
            })
    }

    fn listeners_changed(&self, event_type: &str) {
        if event_type != ABORT {
            return;
        }
        if let Some(owner) = self.owner() {
            retention::refresh(&AbortSignal::from_inner(owner));
        }
    }
}

/// Builds the signal-side listener that removes `registered` from `target`.
fn remover(target: Weak<TargetInner>, registered: Weak<Entry>, event_type: &str) -> Listener {
    let event_type = event_type.to_string();
    Listener::new(move |_: &Event| {
        if let (Some(inner), Some(entry)) = (target.upgrade(), registered.upgrade()) {
            EventTarget { inner }.remove_entry(&event_type, &entry);
        }
    })
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reg = self.inner.registry.lock();
        let mut types: Vec<(&str, usize)> = reg
            .listeners
            .iter()
            .map(|(t, l)| (t.as_str(), l.len()))
            .collect();
        types.sort_unstable();
        f.debug_struct("EventTarget")
            .field("listeners", &types)
            .field("max_listeners", &reg.max_listeners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventInit;
    use std::sync::atomic::AtomicUsize;

    fn event(ty: &str) -> Event {
        Event::new(ty, EventInit::default()).unwrap()
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Listener {
        let log = Arc::clone(log);
        Listener::new(move |_: &Event| log.lock().push(tag))
    }

    #[test]
    fn test_invokes_in_insertion_order() {
        let target = EventTarget::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            target.add_event_listener("foo", &recorder(&log, tag), Default::default());
        }
        assert!(target.dispatch_event(&event("foo")).unwrap());
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_registration_is_ignored() {
        let target = EventTarget::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let l = Listener::new(move |_: &Event| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        target.add_event_listener("foo", &l, Default::default());
        target.add_event_listener("foo", &l, Default::default());
        target.add_event_listener("foo", &l, AddEventListenerOptions::new().with_capture());
        assert_eq!(target.listener_count("foo"), 2);

        target.dispatch_event(&event("foo")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        target.remove_event_listener("foo", &l, true);
        assert_eq!(target.listener_count("foo"), 1);
    }

    #[test]
    fn test_once_runs_a_single_time() {
        let target = EventTarget::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let l = Listener::new(move |_: &Event| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        target.add_event_listener("foo", &l, AddEventListenerOptions::new().with_once());
        target.dispatch_event(&event("foo")).unwrap();
        target.dispatch_event(&event("foo")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(target.listener_count("foo"), 0);
    }

    #[test]
    fn test_removal_during_dispatch_skips_unreached_entry() {
        let target = EventTarget::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let second = recorder(&log, "second");

        let t = target.clone();
        let victim = second.clone();
        let first = Listener::new(move |_: &Event| t.remove_event_listener("foo", &victim, false));

        target.add_event_listener("foo", &first, Default::default());
        target.add_event_listener("foo", &second, Default::default());
        target.dispatch_event(&event("foo")).unwrap();
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_addition_during_dispatch_waits_for_next_dispatch() {
        let target = EventTarget::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let late = recorder(&log, "late");

        let t = target.clone();
        let adder = Listener::new(move |_: &Event| {
            t.add_event_listener("foo", &late, Default::default())
        });
        target.add_event_listener("foo", &adder, Default::default());

        target.dispatch_event(&event("foo")).unwrap();
        assert!(log.lock().is_empty());
        target.dispatch_event(&event("foo")).unwrap();
        assert_eq!(*log.lock(), vec!["late"]);
    }

    #[test]
    fn test_stop_immediate_propagation_skips_the_rest() {
        let target = EventTarget::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let stopper = Listener::new(|e: &Event| e.stop_immediate_propagation());
        target.add_event_listener("foo", &stopper, Default::default());
        target.add_event_listener("foo", &recorder(&log, "after"), Default::default());
        let internal = recorder(&log, "internal");
        target.add_internal(
            "foo",
            &internal,
            InternalFlags {
                resist_stop_propagation: true,
                ..Default::default()
            },
        );

        let ev = event("foo");
        target.dispatch_event(&ev).unwrap();
        assert_eq!(*log.lock(), vec!["internal"]);
        assert!(!ev.cancel_bubble());
    }

    #[test]
    fn test_prevent_default_drives_return_value() {
        let target = EventTarget::new();
        let l = Listener::new(|e: &Event| e.prevent_default());
        target.add_event_listener("foo", &l, Default::default());

        let plain = event("foo");
        assert!(target.dispatch_event(&plain).unwrap());

        let cancelable = Event::new("foo", EventInit { cancelable: true, ..Default::default() }).unwrap();
        assert!(!target.dispatch_event(&cancelable).unwrap());
        assert!(cancelable.default_prevented());
    }

    #[test]
    fn test_passive_listener_cannot_cancel() {
        let target = EventTarget::new();
        let l = Listener::new(|e: &Event| e.prevent_default());
        target.add_event_listener("foo", &l, AddEventListenerOptions::new().with_passive());
        let ev = Event::new("foo", EventInit { cancelable: true, ..Default::default() }).unwrap();
        assert!(target.dispatch_event(&ev).unwrap());
    }

    #[test]
    fn test_recursive_dispatch_is_rejected() {
        let target = EventTarget::new();
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let t = target.clone();
        let l = Listener::new(move |e: &Event| {
            *s.lock() = Some(t.dispatch_event(e));
        });
        target.add_event_listener("foo", &l, Default::default());
        target.dispatch_event(&event("foo")).unwrap();
        assert!(matches!(
            seen.lock().take(),
            Some(Err(Error::EventRecursion { .. }))
        ));
    }

    #[test]
    fn test_panicking_listener_does_not_stop_dispatch() {
        let target = EventTarget::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let bad = Listener::new(|_: &Event| panic!("listener failure"));
        target.add_event_listener("foo", &bad, Default::default());
        target.add_event_listener("foo", &recorder(&log, "ok"), Default::default());
        assert!(target.dispatch_event(&event("foo")).unwrap());
        assert_eq!(*log.lock(), vec!["ok"]);
    }

    #[test]
    fn test_weak_listener_is_pruned_after_drop() {
        let target = EventTarget::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let l = Listener::new(move |_: &Event| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        target.add_event_listener("foo", &l, AddEventListenerOptions::new().with_weak());
        target.dispatch_event(&event("foo")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        drop(l);
        assert_eq!(target.listener_count("foo"), 0);
        target.dispatch_event(&event("foo")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_slot_replaces_in_place() {
        let target = EventTarget::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        target.set_event_handler("foo", Some(recorder(&log, "h1")));
        target.add_event_listener("foo", &recorder(&log, "tail"), Default::default());
        target.set_event_handler("foo", Some(recorder(&log, "h2")));
        assert_eq!(target.listener_count("foo"), 2);

        target.dispatch_event(&event("foo")).unwrap();
        assert_eq!(*log.lock(), vec!["h2", "tail"]);

        target.set_event_handler("foo", None);
        assert!(target.event_handler("foo").is_none());
        assert_eq!(target.listener_count("foo"), 1);
    }

    #[test]
    fn test_signal_option_removes_listener_on_abort() {
        let target = EventTarget::new();
        let controller = crate::AbortController::new();
        let l = Listener::new(|_: &Event| {});
        target.add_event_listener(
            "foo",
            &l,
            AddEventListenerOptions::new().with_signal(controller.signal()),
        );
        assert_eq!(target.listener_count("foo"), 1);
        controller.abort(None);
        assert_eq!(target.listener_count("foo"), 0);

        target.add_event_listener(
            "foo",
            &l,
            AddEventListenerOptions::new().with_signal(controller.signal()),
        );
        assert_eq!(target.listener_count("foo"), 0);
    }

    #[test]
    fn test_signal_bound_registrations_do_not_pile_up_on_the_signal() {
        let controller = crate::AbortController::new();
        let signal = controller.signal();
        let l = Listener::new(|_: &Event| {});

        for round in 0..1000 {
            let target = EventTarget::new();
            let opts = AddEventListenerOptions::new().with_signal(signal);
            match round % 3 {
                0 => {
                    target.add_event_listener("x", &l, opts);
                    target.remove_event_listener("x", &l, false);
                }
                1 => {
                    target.add_event_listener("x", &l, opts.with_once());
                    target.dispatch_event(&event("x")).unwrap();
                }
                _ => target.add_event_listener("x", &l, opts),
            }
        }

        assert_eq!(signal.listener_count(ABORT), 0);
        assert!(signal.entry_count(ABORT) <= 1);
        let signal_target: &EventTarget = signal;
        assert!(!signal_target.inner.registry.lock().warned);
    }

    #[test]
    fn test_internal_entry_dies_with_its_owner() {
        let target = EventTarget::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let internal = Listener::new(move |_: &Event| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        target.add_internal("foo", &internal, InternalFlags::default());
        target.dispatch_event(&event("foo")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        drop(internal);
        assert_eq!(target.listener_count("foo"), 0);
        target.dispatch_event(&event("foo")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_state_after_dispatch() {
        let target = EventTarget::new();
        let ev = event("foo");
        target.dispatch_event(&ev).unwrap();
        assert!(EventTarget::ptr_eq(&ev.target().unwrap(), &target));
        assert!(ev.current_target().is_none());
        assert!(!ev.is_dispatching());
    }

    #[test]
    fn test_max_listeners_override_is_per_target() {
        let target = EventTarget::new();
        target.set_max_listeners(MaxListeners::Unlimited);
        assert_eq!(target.max_listeners(), MaxListeners::Unlimited);
        assert_eq!(EventTarget::new().max_listeners(), default_max_listeners());
    }
}
