//! # Diagnostics subscriber trait.
//!
//! [`Subscribe`] is the extension point for consuming [`Diagnostic`]s
//! asynchronously (exporting metrics, forwarding leak warnings to an alerting
//! system, failing a test on listener panics).
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `SubscriberPanicked`)
//!
//! ## Architecture
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_diagnostic()
//!                                    └─► panic caught → DiagnosticKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the item **for this subscriber only** and publishes
//!   `DiagnosticKind::SubscriberOverflow`.
//! - Items are processed sequentially (FIFO) per subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use abortable::diagnostics::{Diagnostic, DiagnosticKind};
//! use abortable::Subscribe;
//!
//! struct LeakAlerts;
//!
//! #[async_trait]
//! impl Subscribe for LeakAlerts {
//!     async fn on_diagnostic(&self, d: &Diagnostic) {
//!         if matches!(d.kind, DiagnosticKind::MaxListenersExceeded) {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "leak-alerts" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use async_trait::async_trait;

use crate::diagnostics::Diagnostic;

/// Asynchronous diagnostics consumer.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single diagnostic, in FIFO order for this subscriber.
    async fn on_diagnostic(&self, diagnostic: &Diagnostic);

    /// Name used in overflow/panic diagnostics.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to a minimum of 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
