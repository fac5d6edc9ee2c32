//! # Event values passed to listeners.
//!
//! An [`Event`] describes one notification. Its identity fields (`type`,
//! `bubbles`, `cancelable`, `composed`, `is_trusted`, `detail`) are fixed at
//! construction; the propagation and cancellation flags are mutated by
//! listeners *during* a dispatch and read by the dispatch loop.
//!
//! ## Variants
//! - plain event: [`Event::new`]
//! - custom event: [`Event::new_custom`], carries an opaque [`Value`] `detail`
//! - trusted event: created only by the runtime (e.g. the `"abort"` event of an
//!   [`AbortSignal`](crate::AbortSignal)); `is_trusted()` is `true` only for these
//!
//! ## Rules
//! - An event may be dispatched by one target at a time; dispatching it again
//!   from inside one of its own listeners fails with [`Error::EventRecursion`].
//! - `prevent_default` only has an effect on cancelable events and is ignored
//!   while a passive listener runs.
//! - Propagation flags are cleared when a dispatch finishes; `default_prevented`
//!   and `target` are kept.
//!
//! ## Example
//! ```rust
//! use abortable::{Event, EventInit};
//!
//! let ev = Event::new("click", EventInit { cancelable: true, ..Default::default() })?;
//! assert_eq!(ev.event_type(), "click");
//! assert!(!ev.is_trusted());
//! ev.prevent_default();
//! assert!(ev.default_prevented());
//! # Ok::<(), abortable::Error>(())
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;

use crate::error::Error;
use crate::value::Value;

use super::target::EventTarget;

static TIME_ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Milliseconds elapsed since the process time origin (first use).
fn now_ms() -> f64 {
    TIME_ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Construction flags for [`Event::new`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
}

/// Construction flags and payload for [`Event::new_custom`].
#[derive(Debug, Clone, Default)]
pub struct CustomEventInit {
    pub init: EventInit,
    pub detail: Option<Value>,
}

/// Dispatch phase, with the DOM's numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventPhase {
    None = 0,
    CapturingPhase = 1,
    AtTarget = 2,
    BubblingPhase = 3,
}

/// A notification dispatched through an [`EventTarget`].
pub struct Event {
    event_type: String,
    init: EventInit,
    detail: Option<Value>,
    custom: bool,
    is_trusted: bool,
    time_stamp: f64,

    default_prevented: Cell<bool>,
    stop_propagation: Cell<bool>,
    stop_immediate_propagation: Cell<bool>,
    in_passive_listener: Cell<bool>,
    dispatching: Cell<bool>,
    phase: Cell<EventPhase>,
    target: RefCell<Option<EventTarget>>,
    current_target: RefCell<Option<EventTarget>>,
}

impl Event {
    /// Creates an untrusted event.
    ///
    /// ### Errors
    /// [`Error::MissingArgument`] if `event_type` is empty.
    pub fn new(event_type: impl Into<String>, init: EventInit) -> Result<Self, Error> {
        let event_type = validate_type(event_type.into())?;
        Ok(Self::build(event_type, init, None, false, false))
    }

    /// Creates an untrusted custom event carrying `detail`.
    ///
    /// ### Errors
    /// [`Error::MissingArgument`] if `event_type` is empty.
    pub fn new_custom(event_type: impl Into<String>, init: CustomEventInit) -> Result<Self, Error> {
        let event_type = validate_type(event_type.into())?;
        Ok(Self::build(event_type, init.init, init.detail, true, false))
    }

    /// Creates a runtime-originated (trusted), non-cancelable event.
    pub(crate) fn trusted(event_type: &str) -> Self {
        Self::build(event_type.to_string(), EventInit::default(), None, false, true)
    }

    fn build(
        event_type: String,
        init: EventInit,
        detail: Option<Value>,
        custom: bool,
        is_trusted: bool,
    ) -> Self {
        Self {
            event_type,
            init,
            detail,
            custom,
            is_trusted,
            time_stamp: now_ms(),
            default_prevented: Cell::new(false),
            stop_propagation: Cell::new(false),
            stop_immediate_propagation: Cell::new(false),
            in_passive_listener: Cell::new(false),
            dispatching: Cell::new(false),
            phase: Cell::new(EventPhase::None),
            target: RefCell::new(None),
            current_target: RefCell::new(None),
        }
    }

    #[inline]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    #[inline]
    pub fn bubbles(&self) -> bool {
        self.init.bubbles
    }

    #[inline]
    pub fn cancelable(&self) -> bool {
        self.init.cancelable
    }

    #[inline]
    pub fn composed(&self) -> bool {
        self.init.composed
    }

    /// `true` only for events created by the runtime itself.
    #[inline]
    pub fn is_trusted(&self) -> bool {
        self.is_trusted
    }

    /// Creation time in milliseconds relative to the process time origin.
    #[inline]
    pub fn time_stamp(&self) -> f64 {
        self.time_stamp
    }

    /// Payload of a custom event (`None` for plain events).
    #[inline]
    pub fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }

    #[inline]
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    #[inline]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Legacy inverse of [`default_prevented`](Self::default_prevented).
    #[inline]
    pub fn return_value(&self) -> bool {
        !self.default_prevented.get()
    }

    /// Legacy setter: `false` behaves like [`prevent_default`](Self::prevent_default).
    pub fn set_return_value(&self, value: bool) {
        if !value {
            self.prevent_default();
        }
    }

    /// Legacy alias of the stop-propagation flag.
    #[inline]
    pub fn cancel_bubble(&self) -> bool {
        self.stop_propagation.get()
    }

    /// Legacy setter: `true` behaves like [`stop_propagation`](Self::stop_propagation).
    pub fn set_cancel_bubble(&self, value: bool) {
        if value {
            self.stop_propagation();
        }
    }

    /// Marks the event cancelled if it is cancelable and no passive listener is running.
    pub fn prevent_default(&self) {
        if self.init.cancelable && !self.in_passive_listener.get() {
            self.default_prevented.set(true);
        }
    }

    /// Stops propagation to other targets.
    ///
    /// There is no tree here, so remaining listeners on the current target still run.
    pub fn stop_propagation(&self) {
        self.stop_propagation.set(true);
    }

    /// Stops propagation and skips every listener not yet invoked on this dispatch.
    pub fn stop_immediate_propagation(&self) {
        self.stop_propagation.set(true);
        self.stop_immediate_propagation.set(true);
    }

    #[inline]
    pub fn event_phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// Target of the most recent dispatch.
    pub fn target(&self) -> Option<EventTarget> {
        self.target.borrow().clone()
    }

    /// Target whose listeners are currently running (`None` outside dispatch).
    pub fn current_target(&self) -> Option<EventTarget> {
        self.current_target.borrow().clone()
    }

    /// `[current_target]` while dispatching, empty otherwise.
    pub fn composed_path(&self) -> Vec<EventTarget> {
        if self.dispatching.get() {
            self.current_target().into_iter().collect()
        } else {
            Vec::new()
        }
    }

    #[inline]
    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }

    pub(crate) fn begin_dispatch(&self, target: &EventTarget) -> Result<(), Error> {
        if self.dispatching.get() {
            return Err(Error::EventRecursion {
                event_type: self.event_type.clone(),
            });
        }
        self.dispatching.set(true);
        self.phase.set(EventPhase::AtTarget);
        *self.target.borrow_mut() = Some(target.clone());
        *self.current_target.borrow_mut() = Some(target.clone());
        Ok(())
    }

    pub(crate) fn end_dispatch(&self) {
        self.dispatching.set(false);
        self.phase.set(EventPhase::None);
        self.stop_propagation.set(false);
        self.stop_immediate_propagation.set(false);
        self.in_passive_listener.set(false);
        *self.current_target.borrow_mut() = None;
    }

    #[inline]
    pub(crate) fn immediate_propagation_stopped(&self) -> bool {
        self.stop_immediate_propagation.get()
    }

    #[inline]
    pub(crate) fn set_in_passive_listener(&self, value: bool) {
        self.in_passive_listener.set(value);
    }
}

fn validate_type(event_type: String) -> Result<String, Error> {
    if event_type.is_empty() {
        Err(Error::MissingArgument { name: "type" })
    } else {
        Ok(event_type)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(if self.custom { "CustomEvent" } else { "Event" })
            .field("type", &self.event_type)
            .field("is_trusted", &self.is_trusted)
            .field("bubbles", &self.init.bubbles)
            .field("cancelable", &self.init.cancelable)
            .field("default_prevented", &self.default_prevented.get())
            .field("time_stamp", &self.time_stamp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_type_is_rejected() {
        let err = Event::new("", EventInit::default()).unwrap_err();
        assert_eq!(err, Error::MissingArgument { name: "type" });
    }

    #[test]
    fn test_defaults() {
        let ev = Event::new("foo", EventInit::default()).unwrap();
        assert_eq!(ev.event_type(), "foo");
        assert!(!ev.bubbles());
        assert!(!ev.cancelable());
        assert!(ev.detail().is_none());
        assert!(!ev.is_trusted());
        assert_eq!(ev.event_phase(), EventPhase::None);
        assert!(ev.composed_path().is_empty());
    }

    #[test]
    fn test_custom_event_carries_detail() {
        let detail = Value::from("payload");
        let ev = Event::new_custom(
            "foo",
            CustomEventInit {
                detail: Some(detail.clone()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(ev.is_custom());
        assert!(Value::ptr_eq(ev.detail().unwrap(), &detail));
    }

    #[test]
    fn test_prevent_default_requires_cancelable() {
        let ev = Event::new("foo", EventInit::default()).unwrap();
        ev.prevent_default();
        assert!(!ev.default_prevented());
        assert!(ev.return_value());

        let ev = Event::new("foo", EventInit { cancelable: true, ..Default::default() }).unwrap();
        ev.set_return_value(false);
        assert!(ev.default_prevented());
    }

    #[test]
    fn test_passive_listener_cannot_prevent_default() {
        let ev = Event::new("foo", EventInit { cancelable: true, ..Default::default() }).unwrap();
        ev.set_in_passive_listener(true);
        ev.prevent_default();
        assert!(!ev.default_prevented());
    }

    #[test]
    fn test_trusted_events_are_not_cancelable() {
        let ev = Event::trusted("abort");
        assert!(ev.is_trusted());
        assert!(!ev.cancelable());
    }

    #[test]
    fn test_time_stamp_is_monotonic() {
        let a = Event::new("a", EventInit::default()).unwrap();
        let b = Event::new("b", EventInit::default()).unwrap();
        assert!(b.time_stamp() >= a.time_stamp());
    }
}
