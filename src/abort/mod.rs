//! Abort signals, their controller, and the machinery keeping them alive.
//!
//! ## Contents
//! - [`AbortSignal`], [`WeakAbortSignal`] write-once cancellation state on top of an event target
//! - [`AbortController`] owner of one signal
//! - [`aborted`] future resolving on abort
//! - [`retained_count`] introspection of the retention set
//!
//! ## Quick reference
//! ```text
//! AbortController::abort ─┐
//! timeout timer (Weak) ───┼─► abort primitive ─► "abort" event ─► dependents
//! AbortSignal::abort ─────┘
//! ```

mod aborted;
mod controller;
pub(crate) mod retention;
mod signal;

pub use aborted::aborted;
pub use controller::AbortController;
pub use retention::retained_count;
pub use signal::{AbortSignal, WeakAbortSignal};

pub(crate) use signal::SignalInner;
