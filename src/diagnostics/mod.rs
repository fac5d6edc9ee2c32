//! Out-of-band diagnostics: types and the process-wide bus.
//!
//! Conditions that must not interrupt the caller (a panicking listener, a
//! max-listeners leak warning) are reported here instead of being returned.
//! Every report is:
//! 1. logged through `tracing` (`error!` for panics, `warn!` for leak warnings);
//! 2. published on a process-wide [`Bus`] that anyone can [`subscribe`] to.
//!
//! ## Contents
//! - [`DiagnosticKind`], [`Diagnostic`] classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! The bus is created lazily with the capacity from
//! [`Config`](crate::config::Config); call [`Config::install`](crate::config::Config::install)
//! before the first report to pick a different capacity.

mod bus;
mod diagnostic;

use std::any::Any;
use std::sync::OnceLock;

use tokio::sync::broadcast;

pub use bus::Bus;
pub use diagnostic::{Diagnostic, DiagnosticKind};

use crate::config::Config;

static BUS: OnceLock<Bus> = OnceLock::new();

/// Installs the process bus with `capacity`; `false` if it already exists.
pub(crate) fn init_bus(capacity: usize) -> bool {
    BUS.set(Bus::new(capacity)).is_ok()
}

/// Returns the process-wide diagnostics bus.
pub fn bus() -> &'static Bus {
    BUS.get_or_init(|| Bus::new(Config::default().diagnostics_capacity_clamped()))
}

/// Subscribes to diagnostics published after this call.
pub fn subscribe() -> broadcast::Receiver<Diagnostic> {
    bus().subscribe()
}

/// Logs and publishes a diagnostic.
pub(crate) fn report(d: Diagnostic) {
    let event_type = d.event_type.as_deref().unwrap_or("");
    let message = d.message.as_deref().unwrap_or("");
    match d.kind {
        DiagnosticKind::ListenerPanicked => {
            tracing::error!(event_type, message, "listener panicked during dispatch");
        }
        DiagnosticKind::MaxListenersExceeded => {
            tracing::warn!(event_type, count = d.count, max = d.max, "{message}");
        }
        DiagnosticKind::SubscriberPanicked | DiagnosticKind::SubscriberOverflow => {
            let source = d.source.as_deref().unwrap_or("unknown");
            tracing::warn!(source, message, kind = ?d.kind, "diagnostics subscriber issue");
        }
    }
    bus().publish(d);
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
