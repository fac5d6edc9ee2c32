//! # Abort signals.
//!
//! An [`AbortSignal`] is an [`EventTarget`] with a write-once abort state.
//! It is produced by an [`AbortController`](crate::AbortController) or by one of
//! the factories [`AbortSignal::abort`], [`AbortSignal::timeout`], [`AbortSignal::any`].
//!
//! ## State machine
//! ```text
//! pending ──abort(reason)──► aborted (terminal)
//!              │
//!              ├─► state written (aborted, reason)
//!              ├─► released from the retention set
//!              ├─► trusted "abort" dispatched on this signal
//!              └─► every live dependent aborted with the same reason
//! ```
//!
//! ## Composition graph
//! ```text
//! leaf a ──dependents──► any([a, b]) ◄──dependents── leaf b
//!        ◄───sources────             ────sources───►
//! ```
//! - All edges are `Weak`: a composite does not keep its sources alive and a
//!   source does not keep its dependents alive.
//! - `sources` of a composite only ever holds leaves; nesting is flattened when
//!   the composite is built, so propagation is at most two levels deep.
//!
//! ## Lifetime
//! A timeout timer holds only a `Weak` to its signal. Dropping the last handle
//! of a timeout signal cancels the timer; a signal being observed through a
//! non-weak `"abort"` listener is kept alive by the retention set
//! (see [`is_retained`](AbortSignal::is_retained)).

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::dom_exception::DomException;
use crate::error::Error;
use crate::events::{Event, EventTarget, InternalFlags, Listener, ABORT};
use crate::globals::Instance;
use crate::value::Value;

use super::retention;

/// Largest accepted timeout delay in milliseconds.
const MAX_DELAY_MS: u64 = u32::MAX as u64;

#[derive(Default)]
struct State {
    aborted: bool,
    reason: Option<Value>,
}

pub(crate) struct SignalInner {
    target: EventTarget,
    state: Mutex<State>,
    composite: bool,
    timeout: bool,
    sources: Mutex<Vec<Weak<SignalInner>>>,
    dependents: Mutex<Vec<Weak<SignalInner>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    /// Parent of every token handed out, with the listener that cancels it.
    token: OnceLock<(CancellationToken, Listener)>,
}

impl SignalInner {
    fn add_dependent(&self, dependent: &Arc<SignalInner>) {
        let mut deps = self.dependents.lock();
        deps.retain(|w| w.strong_count() > 0);
        deps.push(Arc::downgrade(dependent));
    }
}

impl Drop for SignalInner {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            if !timer.is_finished() {
                timer.abort();
                tracing::trace!("timeout timer cancelled: signal dropped");
            }
        }

        // A dependent may just have lost its last live source.
        let dependents: Vec<Arc<SignalInner>> = self
            .dependents
            .get_mut()
            .drain(..)
            .filter_map(|w| w.upgrade())
            .collect();
        for dependent in dependents {
            retention::refresh(&AbortSignal::from_inner(dependent));
        }
    }
}

/// Cooperative cancellation signal.
///
/// Cloning is cheap; clones share state and identity.
#[derive(Clone)]
pub struct AbortSignal {
    inner: Arc<SignalInner>,
}

/// Default reason used when none is supplied.
pub(crate) fn default_reason() -> Value {
    Value::from(DomException::abort_error())
}

/// Aborts `inner` with `reason`, then its live dependents.
///
/// No-op if already aborted.
pub(crate) fn abort_signal(inner: &Arc<SignalInner>, reason: Value) {
    {
        let mut state = inner.state.lock();
        if state.aborted {
            return;
        }
        state.aborted = true;
        state.reason = Some(reason.clone());
    }
    retention::release(inner);
    tracing::debug!(
        composite = inner.composite,
        timeout = inner.timeout,
        reason = %reason,
        "signal aborted"
    );

    let event = Event::trusted(ABORT);
    if let Err(e) = inner.target.dispatch_event(&event) {
        tracing::debug!(error = %e, "abort event not dispatched");
    }

    let dependents: Vec<Arc<SignalInner>> = inner
        .dependents
        .lock()
        .iter()
        .filter_map(Weak::upgrade)
        .collect();
    for dependent in dependents {
        abort_signal(&dependent, reason.clone());
    }
}

impl AbortSignal {
    pub(crate) fn pending(composite: bool, timeout: bool) -> Self {
        let inner = Arc::new_cyclic(|me| SignalInner {
            target: EventTarget::for_signal(me.clone()),
            state: Mutex::new(State::default()),
            composite,
            timeout,
            sources: Mutex::new(Vec::new()),
            dependents: Mutex::new(Vec::new()),
            timer: Mutex::new(None),
            token: OnceLock::new(),
        });
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<SignalInner>) -> Self {
        Self { inner }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &Arc<SignalInner> {
        &self.inner
    }

    /// Returns a signal that is already aborted with `reason`
    /// (default: `AbortError` [`DomException`]).
    pub fn abort(reason: Option<Value>) -> Self {
        let signal = Self::pending(false, false);
        abort_signal(&signal.inner, reason.unwrap_or_else(default_reason));
        signal
    }

    /// Returns a signal that aborts with a `TimeoutError` after `delay_ms`.
    ///
    /// The timer runs on the current tokio runtime and holds only a weak
    /// reference; dropping the signal cancels it.
    ///
    /// ### Errors
    /// - [`Error::OutOfRange`] if `delay_ms` does not fit in 32 bits;
    /// - [`Error::MethodNotImplemented`] when called outside a tokio runtime.
    pub fn timeout(delay_ms: u64) -> Result<Self, Error> {
        if delay_ms > MAX_DELAY_MS {
            return Err(Error::OutOfRange {
                name: "delay",
                range: ">= 0 && <= 4294967295",
                received: delay_ms.to_string(),
            });
        }
        let handle = Handle::try_current().map_err(|_| Error::MethodNotImplemented {
            method: "AbortSignal::timeout",
            reason: "no tokio runtime is running",
        })?;

        let signal = Self::pending(false, true);
        let weak = Arc::downgrade(&signal.inner);
        let timer = handle.spawn(async move {
            time::sleep(Duration::from_millis(delay_ms)).await;
            match weak.upgrade() {
                Some(inner) => {
                    tracing::trace!(delay_ms, "timeout fired");
                    abort_signal(&inner, Value::from(DomException::timeout_error()));
                }
                None => tracing::trace!(delay_ms, "timeout fired after signal was dropped"),
            }
        });
        *signal.inner.timer.lock() = Some(timer);
        Ok(signal)
    }

    /// Returns a composite signal that aborts when any of `signals` aborts.
    ///
    /// - empty input → a signal that never aborts on its own;
    /// - an input already aborted → the result is aborted with the first such
    ///   input's reason and no edges are recorded;
    /// - composite inputs contribute their (leaf) sources, de-duplicated.
    pub fn any(signals: &[AbortSignal]) -> Self {
        let result = Self::pending(true, false);

        if let Some(done) = signals.iter().find(|s| s.aborted()) {
            abort_signal(&result.inner, done.reason().unwrap_or_else(default_reason));
            return result;
        }

        let mut leaves: Vec<Arc<SignalInner>> = Vec::new();
        for signal in signals {
            let candidates: Vec<Arc<SignalInner>> = if signal.inner.composite {
                signal
                    .inner
                    .sources
                    .lock()
                    .iter()
                    .filter_map(Weak::upgrade)
                    .collect()
            } else {
                vec![Arc::clone(&signal.inner)]
            };
            for leaf in candidates {
                if !leaves.iter().any(|l| Arc::ptr_eq(l, &leaf)) {
                    leaves.push(leaf);
                }
            }
        }

        for leaf in &leaves {
            leaf.add_dependent(&result.inner);
        }
        *result.inner.sources.lock() = leaves.iter().map(Arc::downgrade).collect();
        result
    }

    /// Like [`any`](Self::any) for dynamically typed inputs.
    ///
    /// ### Errors
    /// [`Error::InvalidArgumentType`] if an element is not an `AbortSignal`;
    /// nothing is created in that case.
    pub fn any_of(values: &[Instance]) -> Result<Self, Error> {
        let signals = values
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Instance::AbortSignal(s) => Ok(s.clone()),
                other => Err(Error::InvalidArgumentType {
                    name: format!("signals[{i}]"),
                    expected: "AbortSignal",
                    received: other.kind_name().to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::any(&signals))
    }

    #[inline]
    pub fn aborted(&self) -> bool {
        self.inner.state.lock().aborted
    }

    /// The abort reason; `None` while pending.
    pub fn reason(&self) -> Option<Value> {
        self.inner.state.lock().reason.clone()
    }

    /// Returns the stored reason as the error iff aborted.
    ///
    /// The error is the same value the signal was aborted with
    /// (`Value::ptr_eq` holds).
    pub fn throw_if_aborted(&self) -> Result<(), Value> {
        let state = self.inner.state.lock();
        if !state.aborted {
            return Ok(());
        }
        Err(state.reason.clone().unwrap_or_else(default_reason))
    }

    /// Assigns the `onabort` handler property (`None` clears it).
    pub fn set_onabort(&self, handler: Option<Listener>) {
        self.inner.target.set_event_handler(ABORT, handler);
    }

    pub fn onabort(&self) -> Option<Listener> {
        self.inner.target.event_handler(ABORT)
    }

    /// `true` for signals built by [`any`](Self::any).
    #[inline]
    pub fn is_composite(&self) -> bool {
        self.inner.composite
    }

    /// `true` for signals built by [`timeout`](Self::timeout).
    #[inline]
    pub fn is_timeout(&self) -> bool {
        self.inner.timeout
    }

    /// `true` while the process-wide retention set keeps this signal alive.
    pub fn is_retained(&self) -> bool {
        retention::contains(&self.inner)
    }

    /// Number of live leaf sources of a composite signal.
    pub fn source_count(&self) -> usize {
        self.inner
            .sources
            .lock()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Number of live composites depending on this signal.
    pub fn dependent_count(&self) -> usize {
        self.inner
            .dependents
            .lock()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Cancels a pending timeout timer without aborting the signal.
    ///
    /// Returns `true` if a timer was still pending. A released timeout signal
    /// stays pending and is no longer retained.
    pub fn release_timer(&self) -> bool {
        let Some(timer) = self.inner.timer.lock().take() else {
            return false;
        };
        let pending = !timer.is_finished();
        timer.abort();
        retention::refresh(self);
        pending
    }

    /// Whether this signal should currently be held by the retention set.
    pub(crate) fn should_retain(&self) -> bool {
        let eligible = (self.inner.timeout && self.inner.timer.lock().is_some())
            || (self.inner.composite
                && self
                    .inner
                    .sources
                    .lock()
                    .iter()
                    .any(|w| w.strong_count() > 0));
        eligible && !self.aborted() && self.inner.target.retaining_listener_count(ABORT) > 0
    }

    /// Returns a token that is cancelled when this signal aborts.
    ///
    /// Every call hands out a child of one token bridged to the signal, so
    /// cancelling a returned token affects only that token and dropping it
    /// leaves nothing behind on the signal. The bridge does not keep the
    /// signal alive; a signal dropped while pending never cancels its tokens.
    pub fn cancellation_token(&self) -> CancellationToken {
        let (parent, _) = self.inner.token.get_or_init(|| {
            let parent = CancellationToken::new();
            let cancel = parent.clone();
            let bridge = Listener::new(move |_: &Event| cancel.cancel());
            self.inner.target.add_internal(
                ABORT,
                &bridge,
                InternalFlags {
                    once: true,
                    weak: true,
                    resist_stop_propagation: true,
                },
            );
            (parent, bridge)
        });
        // Covers an abort that landed before the bridge was registered.
        if self.aborted() {
            parent.cancel();
        }
        parent.child_token()
    }

    /// Non-owning handle.
    pub fn downgrade(&self) -> WeakAbortSignal {
        WeakAbortSignal(Arc::downgrade(&self.inner))
    }

    /// `true` iff both handles refer to the same signal.
    #[inline]
    pub fn ptr_eq(a: &AbortSignal, b: &AbortSignal) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl Deref for AbortSignal {
    type Target = EventTarget;

    fn deref(&self) -> &EventTarget {
        &self.inner.target
    }
}

impl TryFrom<EventTarget> for AbortSignal {
    type Error = Error;

    /// Recovers the signal behind a target obtained from one.
    fn try_from(target: EventTarget) -> Result<Self, Error> {
        target
            .owner()
            .map(Self::from_inner)
            .ok_or(Error::InvalidReceiver {
                expected: "AbortSignal",
            })
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("AbortSignal")
            .field("aborted", &state.aborted)
            .field("reason", &state.reason)
            .field("composite", &self.inner.composite)
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

/// Non-owning [`AbortSignal`] handle.
#[derive(Clone, Debug)]
pub struct WeakAbortSignal(Weak<SignalInner>);

impl WeakAbortSignal {
    pub fn upgrade(&self) -> Option<AbortSignal> {
        self.0.upgrade().map(AbortSignal::from_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::AddEventListenerOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(hits: &Arc<AtomicUsize>) -> Listener {
        let hits = Arc::clone(hits);
        Listener::new(move |_: &Event| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_abort_factory_uses_default_reason() {
        let s = AbortSignal::abort(None);
        assert!(s.aborted());
        let reason = s.reason().unwrap();
        let exc = reason.as_dom_exception().unwrap();
        assert_eq!(exc.name(), "AbortError");
        assert_eq!(exc.code(), 20);
    }

    #[test]
    fn test_throw_if_aborted_returns_same_reason() {
        assert!(AbortSignal::any(&[]).throw_if_aborted().is_ok());

        let reason = Value::from("why");
        let s = AbortSignal::abort(Some(reason.clone()));
        let err = s.throw_if_aborted().unwrap_err();
        assert!(Value::ptr_eq(&err, &reason));
    }

    #[test]
    fn test_abort_is_write_once() {
        let s = AbortSignal::pending(false, false);
        let hits = Arc::new(AtomicUsize::new(0));
        s.add_event_listener(ABORT, &counter(&hits), Default::default());

        abort_signal(&s.inner, Value::from("first"));
        abort_signal(&s.inner, Value::from("second"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(s.reason().unwrap().as_str(), Some("first"));
    }

    #[test]
    fn test_abort_event_is_trusted_and_sees_new_state() {
        let s = AbortSignal::pending(false, false);
        let seen = Arc::new(Mutex::new(None));
        let seen2 = Arc::clone(&seen);
        let weak = s.downgrade();
        s.add_event_listener(
            ABORT,
            &Listener::new(move |e: &Event| {
                let aborted = weak.upgrade().is_some_and(|s| s.aborted());
                *seen2.lock() = Some((e.is_trusted(), e.cancelable(), aborted));
            }),
            Default::default(),
        );
        abort_signal(&s.inner, default_reason());
        assert_eq!(*seen.lock(), Some((true, false, true)));
    }

    #[test]
    fn test_any_empty_never_aborts() {
        let s = AbortSignal::any(&[]);
        assert!(s.is_composite());
        assert!(!s.aborted());
        assert_eq!(s.source_count(), 0);
    }

    #[test]
    fn test_any_short_circuits_on_aborted_input() {
        let pending = AbortSignal::pending(false, false);
        let first = AbortSignal::abort(Some(Value::from("r1")));
        let second = AbortSignal::abort(Some(Value::from("r2")));
        let s = AbortSignal::any(&[pending.clone(), first, second]);
        assert!(s.aborted());
        assert_eq!(s.reason().unwrap().as_str(), Some("r1"));
        assert_eq!(pending.dependent_count(), 0);
    }

    #[test]
    fn test_any_flattens_composites() {
        let a = AbortSignal::pending(false, false);
        let b = AbortSignal::pending(false, false);
        let inner = AbortSignal::any(&[a.clone(), b.clone()]);
        let outer = AbortSignal::any(&[inner.clone(), a.clone()]);
        assert_eq!(outer.source_count(), 2);
        assert_eq!(a.dependent_count(), 2);

        abort_signal(&b.inner, Value::from("b"));
        assert!(inner.aborted());
        assert!(outer.aborted());
        assert_eq!(outer.reason().unwrap().as_str(), Some("b"));
        assert!(!a.aborted());
    }

    #[test]
    fn test_edges_do_not_keep_signals_alive() {
        let a = AbortSignal::pending(false, false);
        let composite = AbortSignal::any(&[a.clone()]);
        let weak_composite = composite.downgrade();
        drop(composite);
        assert!(weak_composite.upgrade().is_none());

        let weak_a = a.downgrade();
        let composite = AbortSignal::any(&[a.clone()]);
        drop(a);
        assert!(weak_a.upgrade().is_none());
        assert_eq!(composite.source_count(), 0);
    }

    #[test]
    fn test_onabort_handler_runs_on_abort() {
        let s = AbortSignal::pending(false, false);
        let hits = Arc::new(AtomicUsize::new(0));
        s.set_onabort(Some(counter(&hits)));
        assert!(s.onabort().is_some());
        abort_signal(&s.inner, default_reason());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_try_from_event_target() {
        let s = AbortSignal::pending(false, false);
        let target: EventTarget = (*s).clone();
        let back = AbortSignal::try_from(target).unwrap();
        assert!(AbortSignal::ptr_eq(&s, &back));

        let err = AbortSignal::try_from(EventTarget::new()).unwrap_err();
        assert_eq!(err, Error::InvalidReceiver { expected: "AbortSignal" });
    }

    #[test]
    fn test_any_of_rejects_non_signals() {
        let values = [
            Instance::AbortSignal(AbortSignal::any(&[])),
            Instance::EventTarget(EventTarget::new()),
        ];
        let err = AbortSignal::any_of(&values).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentType { ref name, .. } if name == "signals[1]"));
    }

    #[test]
    fn test_composite_retained_only_while_observed() {
        let a = AbortSignal::pending(false, false);
        let composite = AbortSignal::any(&[a.clone()]);
        assert!(!composite.is_retained());

        let l = Listener::new(|_: &Event| {});
        composite.add_event_listener(ABORT, &l, Default::default());
        assert!(composite.is_retained());

        composite.remove_event_listener(ABORT, &l, false);
        assert!(!composite.is_retained());

        composite.add_event_listener(ABORT, &l, AddEventListenerOptions::new().with_weak());
        assert!(!composite.is_retained());
    }

    #[test]
    fn test_timeout_requires_runtime() {
        let err = AbortSignal::timeout(10).unwrap_err();
        assert!(matches!(err, Error::MethodNotImplemented { .. }));
    }

    #[test]
    fn test_timeout_rejects_out_of_range_delay() {
        let err = AbortSignal::timeout(MAX_DELAY_MS + 1).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { name: "delay", .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_aborts_with_timeout_error() {
        let s = AbortSignal::timeout(100).unwrap();
        assert!(s.is_timeout());
        assert!(!s.aborted());

        time::sleep(Duration::from_millis(150)).await;
        assert!(s.aborted());
        let reason = s.reason().unwrap();
        assert_eq!(reason.as_dom_exception().unwrap().name(), "TimeoutError");
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_timer_keeps_signal_pending() {
        let s = AbortSignal::timeout(100).unwrap();
        assert!(s.release_timer());
        assert!(!s.release_timer());
        time::sleep(Duration::from_millis(150)).await;
        assert!(!s.aborted());
    }

    #[test]
    fn test_composite_released_once_its_sources_are_gone() {
        let a = AbortSignal::pending(false, false);
        let composite = AbortSignal::any(&[a.clone()]);
        composite.add_event_listener(ABORT, &Listener::new(|_: &Event| {}), Default::default());
        assert!(composite.is_retained());

        let weak = composite.downgrade();
        drop(composite);
        assert!(weak.upgrade().is_some());

        drop(a);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_composite_kept_while_another_source_lives() {
        let a = AbortSignal::pending(false, false);
        let b = AbortSignal::pending(false, false);
        let composite = AbortSignal::any(&[a.clone(), b.clone()]);
        composite.add_event_listener(ABORT, &Listener::new(|_: &Event| {}), Default::default());
        let weak = composite.downgrade();
        drop(composite);

        drop(a);
        let survivor = weak.upgrade().unwrap();
        assert!(survivor.is_retained());
        drop(survivor);

        drop(b);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_cancellation_tokens_share_one_bridge() {
        let s = AbortSignal::pending(false, false);
        for _ in 0..1000 {
            drop(s.cancellation_token());
        }
        assert_eq!(s.entry_count(ABORT), 1);

        let first = s.cancellation_token();
        let second = s.cancellation_token();
        first.cancel();
        assert!(!second.is_cancelled());

        abort_signal(&s.inner, default_reason());
        assert!(second.is_cancelled());
        assert!(s.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancellation_token_follows_signal() {
        let s = AbortSignal::pending(false, false);
        let token = s.cancellation_token();
        assert!(!token.is_cancelled());
        abort_signal(&s.inner, default_reason());
        assert!(token.is_cancelled());
        assert!(AbortSignal::abort(None).cancellation_token().is_cancelled());
    }
}
