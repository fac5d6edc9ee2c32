//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints diagnostics to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [listener-panicked] type=abort msg="boom"
//! [max-listeners] type=foo count=11 max=10
//! [subscriber-panicked] subscriber=metrics msg="boom"
//! [subscriber-overflow] subscriber=metrics reason=full
//! ```

use async_trait::async_trait;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::subscribers::Subscribe;

/// Stdout logging subscriber, enabled via the `logging` feature.
///
/// Not intended for production use; implement [`Subscribe`] for structured output.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_diagnostic(&self, d: &Diagnostic) {
        let event_type = d.event_type.as_deref().unwrap_or("-");
        let source = d.source.as_deref().unwrap_or("-");
        let message = d.message.as_deref().unwrap_or("");
        match d.kind {
            DiagnosticKind::ListenerPanicked => {
                println!("[listener-panicked] type={event_type} msg={message:?}");
            }
            DiagnosticKind::MaxListenersExceeded => {
                println!(
                    "[max-listeners] type={event_type} count={:?} max={:?}",
                    d.count, d.max
                );
            }
            DiagnosticKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={source} msg={message:?}");
            }
            DiagnosticKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={source} reason={message}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
