//! # Diagnostics subscribers.
//!
//! [`Subscribe`] consumers attached through a [`SubscriberSet`] receive every
//! [`Diagnostic`](crate::diagnostics::Diagnostic) published on the process bus
//! once [`SubscriberSet::listen`] is called.
//!
//! ## Architecture
//! ```text
//! dispatch / registry ── report(d) ──► tracing + Bus ──► SubscriberSet::listen()
//!                                                              │
//!                                                    ┌─────────┼─────────┐
//!                                                    ▼         ▼         ▼
//!                                                LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
