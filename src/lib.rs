//! # abortable
//!
//! **abortable** is an event-target and abort-signal runtime for Rust.
//!
//! It provides a listener registry with synchronous, ordered dispatch
//! ([`EventTarget`]) and a cooperative cancellation primitive built on top of
//! it ([`AbortSignal`] / [`AbortController`]), including timeouts and
//! composition of signals, without ever keeping dropped signals alive.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌────────────────┐   ┌────────────────────┐   ┌──────────────────────┐
//!   │AbortController │   │AbortSignal::timeout│   │ AbortSignal::any([]) │
//!   │   .abort(r)    │   │ (tokio timer, Weak)│   │ (composite, flatten) │
//!   └───────┬────────┘   └─────────┬──────────┘   └──────────┬───────────┘
//!           ▼                      ▼                         │ Weak edges
//! ┌──────────────────────────────────────────────────────────┴───────────┐
//! │  abort primitive (write-once)                                        │
//! │  - set aborted + reason                                              │
//! │  - release from retention set                                        │
//! │  - dispatch trusted "abort" ──► EventTarget (listener registry)      │
//! │  - abort live dependents with the same reason                        │
//! └────────────────────────────────┬─────────────────────────────────────┘
//!                                  │ listener panic / max-listeners warning
//!                                  ▼
//!                ┌─────────────────────────────────────┐
//!                │ diagnostics: tracing + broadcast Bus│
//!                └───────────────────┬─────────────────┘
//!                                    ▼
//!                         SubscriberSet (per-sub queues)
//!                          ┌─────────┼─────────┐
//!                          ▼         ▼         ▼
//!                      LogWriter  Metrics   Custom
//! ```
//!
//! ### Dispatch
//! ```text
//! dispatch_event(event)
//!   ├─► reject if event is already dispatching
//!   ├─► snapshot listeners for event.type
//!   ├─► for each entry (insertion order):
//!   │     ├─ removed meanwhile        ─► skip
//!   │     ├─ stop_immediate_propagation ─► skip (internal listeners still run)
//!   │     ├─ once                     ─► remove, then invoke
//!   │     └─ panic                    ─► report, continue
//!   └─► return !(cancelable && default_prevented)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / functions                         |
//! |-------------------|---------------------------------------------------------------|-----------------------------------------------|
//! | **Events**        | Listener registry, dispatch, handler properties.              | [`EventTarget`], [`Event`], [`Listener`]      |
//! | **Cancellation**  | Write-once abort state, timeouts, composition.                | [`AbortSignal`], [`AbortController`]          |
//! | **Async bridges** | Await an abort or hand it to tokio code.                      | [`aborted`], [`AbortSignal::cancellation_token`] |
//! | **Diagnostics**   | Out-of-band reports of listener panics and leak warnings.     | [`diagnostics`], [`Subscribe`], [`SubscriberSet`] |
//! | **Errors**        | Typed argument and state errors.                              | [`Error`], [`DomException`]                   |
//! | **Configuration** | Listener thresholds and diagnostics capacity.                 | [`Config`], [`MaxListeners`]                  |
//! | **Globals**       | Constructor table and all-or-nothing installation.            | [`Intrinsic`], [`polyfill`]                   |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use abortable::{AbortController, AbortSignal, Event, Listener, Value};
//!
//! let controller = AbortController::new();
//! let composite = AbortSignal::any(&[controller.signal().clone()]);
//!
//! let seen = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
//! let flag = seen.clone();
//! composite.add_event_listener(
//!     "abort",
//!     &Listener::new(move |ev: &Event| {
//!         assert!(ev.is_trusted());
//!         flag.store(true, std::sync::atomic::Ordering::SeqCst);
//!     }),
//!     Default::default(),
//! );
//!
//! controller.abort(Some(Value::from("user cancelled")));
//! assert!(seen.load(std::sync::atomic::Ordering::SeqCst));
//! assert_eq!(composite.reason().unwrap().as_str(), Some("user cancelled"));
//! ```
mod abort;
mod config;
pub mod diagnostics;
mod dom_exception;
mod error;
mod events;
mod globals;
mod subscribers;
mod value;

// ---- Public re-exports ----

pub use abort::{aborted, retained_count, AbortController, AbortSignal, WeakAbortSignal};
pub use config::{
    default_max_listeners, set_default_max_listeners, set_max_listeners, Config, MaxListeners,
};
pub use dom_exception::DomException;
pub use error::Error;
pub use events::{
    AddEventListenerOptions, CustomEventInit, Event, EventInit, EventListener, EventPhase,
    EventTarget, Listener,
};
pub use globals::{polyfill, GlobalScope, Instance, Intrinsic};
pub use subscribers::{Subscribe, SubscriberSet};
pub use value::Value;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
