//! Event model and listener registry.
//!
//! ## Contents
//! - [`Event`], [`EventInit`], [`CustomEventInit`], [`EventPhase`] notification values
//! - [`EventListener`], [`Listener`], [`AddEventListenerOptions`] callbacks and options
//! - [`EventTarget`] per-type ordered registry with synchronous dispatch
//!
//! ## Quick reference
//! - **Dispatchers**: user code via `dispatch_event`, and the abort machinery
//!   (trusted `"abort"` events on signals).
//! - **Out-of-band reports**: listener panics and max-listeners warnings go to
//!   [`diagnostics`](crate::diagnostics), never to the dispatcher.

mod event;
mod listener;
mod target;

pub use event::{CustomEventInit, Event, EventInit, EventPhase};
pub use listener::{AddEventListenerOptions, EventListener, Listener};
pub use target::EventTarget;

pub(crate) use target::{InternalFlags, ABORT};
