//! # Constructor table and global installation.
//!
//! Hosts that expose the runtime's types by name (a scripting bridge, a plugin
//! registry) use [`Intrinsic`] as the constructor table and [`Instance`] as the
//! dynamically typed result. [`polyfill`] installs the whole table into a
//! [`GlobalScope`].
//!
//! ## Rules
//! - `AbortSignal` cannot be constructed directly; signals come from a
//!   controller or from the `abort`/`timeout`/`any` factories.
//! - Installation is all-or-nothing: if every name is already present nothing
//!   changes, otherwise all six names are (re)defined together.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

use crate::abort::{AbortController, AbortSignal};
use crate::dom_exception::DomException;
use crate::error::Error;
use crate::events::{CustomEventInit, Event, EventInit, EventTarget};

/// Constructible runtime types, by global name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    AbortController,
    AbortSignal,
    DomException,
    CustomEvent,
    Event,
    EventTarget,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 6] = [
        Intrinsic::AbortController,
        Intrinsic::AbortSignal,
        Intrinsic::DomException,
        Intrinsic::CustomEvent,
        Intrinsic::Event,
        Intrinsic::EventTarget,
    ];

    /// Global name of the type.
    pub fn name(&self) -> &'static str {
        match self {
            Intrinsic::AbortController => "AbortController",
            Intrinsic::AbortSignal => "AbortSignal",
            Intrinsic::DomException => "DOMException",
            Intrinsic::CustomEvent => "CustomEvent",
            Intrinsic::Event => "Event",
            Intrinsic::EventTarget => "EventTarget",
        }
    }

    /// Constructs an instance; `arg` is the event type or exception message.
    ///
    /// ### Errors
    /// - [`Error::IllegalConstruction`] for `AbortSignal`;
    /// - [`Error::MissingArgument`] for events without a type.
    pub fn construct(&self, arg: Option<&str>) -> Result<Instance, Error> {
        match self {
            Intrinsic::AbortController => Ok(Instance::AbortController(Arc::new(AbortController::new()))),
            Intrinsic::AbortSignal => Err(Error::IllegalConstruction {
                type_name: "AbortSignal",
            }),
            Intrinsic::DomException => Ok(Instance::DomException(DomException::new(
                arg.unwrap_or_default(),
                "",
            ))),
            Intrinsic::CustomEvent => {
                let ty = arg.ok_or(Error::MissingArgument { name: "type" })?;
                Ok(Instance::Event(Rc::new(Event::new_custom(ty, CustomEventInit::default())?)))
            }
            Intrinsic::Event => {
                let ty = arg.ok_or(Error::MissingArgument { name: "type" })?;
                Ok(Instance::Event(Rc::new(Event::new(ty, EventInit::default())?)))
            }
            Intrinsic::EventTarget => Ok(Instance::EventTarget(EventTarget::new())),
        }
    }
}

/// A dynamically typed runtime value.
#[derive(Debug, Clone)]
pub enum Instance {
    AbortController(Arc<AbortController>),
    AbortSignal(AbortSignal),
    DomException(DomException),
    Event(Rc<Event>),
    EventTarget(EventTarget),
}

impl Instance {
    /// The event target behind this value, if it is one.
    pub fn as_event_target(&self) -> Option<EventTarget> {
        match self {
            Instance::EventTarget(t) => Some(t.clone()),
            Instance::AbortSignal(s) => Some((**s).clone()),
            _ => None,
        }
    }

    /// Type name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Instance::AbortController(_) => "AbortController",
            Instance::AbortSignal(_) => "AbortSignal",
            Instance::DomException(_) => "DOMException",
            Instance::Event(e) if e.is_custom() => "CustomEvent",
            Instance::Event(_) => "Event",
            Instance::EventTarget(_) => "EventTarget",
        }
    }
}

/// A namespace the constructor table can be installed into.
pub trait GlobalScope {
    fn contains(&self, name: &str) -> bool;
    fn define(&mut self, name: &'static str, value: Intrinsic);
}

impl<S: BuildHasher> GlobalScope for HashMap<String, Intrinsic, S> {
    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn define(&mut self, name: &'static str, value: Intrinsic) {
        self.insert(name.to_string(), value);
    }
}

/// Installs every [`Intrinsic`] into `scope` unless all are already present.
///
/// Returns `true` if the table was installed.
pub fn polyfill<G: GlobalScope + ?Sized>(scope: &mut G) -> bool {
    if Intrinsic::ALL.iter().all(|i| scope.contains(i.name())) {
        return false;
    }
    for intrinsic in Intrinsic::ALL {
        scope.define(intrinsic.name(), intrinsic);
    }
    tracing::debug!(count = Intrinsic::ALL.len(), "intrinsics installed");
    true
}
