//! # Out-of-band diagnostics emitted by the runtime.
//!
//! The [`DiagnosticKind`] enum classifies the non-fatal conditions the runtime
//! reports without interrupting the caller:
//! - **Dispatch**: a listener panicked while handling an event
//! - **Registry**: a target crossed its max-listeners threshold
//! - **Subscribers**: a diagnostics subscriber panicked or dropped an item
//!
//! The [`Diagnostic`] struct carries the metadata (event type, counts, message).
//!
//! ## Ordering guarantees
//! Each diagnostic has a globally unique sequence number (`seq`) that increases
//! monotonically, so consumers can restore emission order.
//!
//! ## Example
//! ```rust
//! use abortable::diagnostics::{Diagnostic, DiagnosticKind};
//!
//! let d = Diagnostic::max_listeners_exceeded("abort", 11, 10);
//! assert_eq!(d.kind, DiagnosticKind::MaxListenersExceeded);
//! assert_eq!(d.event_type.as_deref(), Some("abort"));
//! assert_eq!(d.count, Some(11));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for diagnostic ordering.
static DIAGNOSTIC_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A listener panicked during dispatch; the remaining listeners still ran.
    ///
    /// Sets:
    /// - `event_type`: type of the event being dispatched
    /// - `message`: panic payload
    ListenerPanicked,

    /// More listeners were added for one type than the target's threshold.
    ///
    /// Emitted at most once per target until its threshold is reset.
    ///
    /// Sets:
    /// - `event_type`: event type that crossed the threshold
    /// - `count`: listener count after the add
    /// - `max`: configured threshold
    /// - `message`: leak warning text
    MaxListenersExceeded,

    /// A diagnostics subscriber panicked while processing an item.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `message`: panic payload
    SubscriberPanicked,

    /// A diagnostics subscriber dropped an item (queue full or closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `message`: `"full"` or `"closed"`
    SubscriberOverflow,
}

/// Runtime diagnostic with optional metadata.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Classification.
    pub kind: DiagnosticKind,
    /// Event type involved, if any.
    pub event_type: Option<Arc<str>>,
    /// Name of the reporting component (subscriber name), if any.
    pub source: Option<Arc<str>>,
    /// Human-readable detail.
    pub message: Option<Arc<str>>,
    /// Listener count, for threshold warnings.
    pub count: Option<usize>,
    /// Threshold, for threshold warnings.
    pub max: Option<usize>,
}

impl Diagnostic {
    /// Creates a diagnostic of the given kind with current timestamp and next sequence number.
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            seq: DIAGNOSTIC_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            event_type: None,
            source: None,
            message: None,
            count: None,
            max: None,
        }
    }

    #[inline]
    pub fn with_event_type(mut self, event_type: impl Into<Arc<str>>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[inline]
    pub fn with_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    #[inline]
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Creates a listener panic diagnostic.
    pub fn listener_panicked(event_type: &str, info: String) -> Self {
        Diagnostic::new(DiagnosticKind::ListenerPanicked)
            .with_event_type(event_type)
            .with_message(info)
    }

    /// Creates the max-listeners leak warning.
    pub fn max_listeners_exceeded(event_type: &str, count: usize, max: usize) -> Self {
        Diagnostic::new(DiagnosticKind::MaxListenersExceeded)
            .with_event_type(event_type)
            .with_count(count)
            .with_max(max)
            .with_message(format!(
                "Possible EventTarget memory leak detected. {count} {event_type} listeners \
                 added to EventTarget. MaxListeners is {max}. Use set_max_listeners() to increase limit"
            ))
    }

    /// Creates a subscriber overflow diagnostic.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Diagnostic::new(DiagnosticKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_message(reason)
    }

    /// Creates a subscriber panic diagnostic.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Diagnostic::new(DiagnosticKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_message(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, DiagnosticKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, DiagnosticKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Diagnostic::new(DiagnosticKind::ListenerPanicked);
        let b = Diagnostic::new(DiagnosticKind::ListenerPanicked);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_leak_warning_text() {
        let d = Diagnostic::max_listeners_exceeded("foo", 3, 2);
        let msg = d.message.as_deref().unwrap_or_default();
        assert!(msg.starts_with("Possible EventTarget memory leak detected. 3 foo listeners"));
        assert!(msg.contains("MaxListeners is 2"));
    }
}
