//! # Abort controller.
//!
//! [`AbortController`] owns exactly one [`AbortSignal`], created on first use.
//! The signal is shared: handing it out keeps it usable after the controller
//! is dropped.
//!
//! ## Example
//! ```rust
//! use abortable::{AbortController, Value};
//!
//! let controller = AbortController::new();
//! let signal = controller.signal().clone();
//! assert!(!signal.aborted());
//!
//! controller.abort(Some(Value::from("shutdown")));
//! controller.abort(Some(Value::from("ignored")));
//! assert_eq!(signal.reason().unwrap().as_str(), Some("shutdown"));
//! ```

use std::fmt;
use std::sync::OnceLock;

use crate::value::Value;

use super::signal::{abort_signal, default_reason, AbortSignal};

/// Owner of one abort signal.
#[derive(Default)]
pub struct AbortController {
    signal: OnceLock<AbortSignal>,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The controlled signal, created on first access.
    pub fn signal(&self) -> &AbortSignal {
        self.signal.get_or_init(|| AbortSignal::pending(false, false))
    }

    /// Aborts the signal with `reason` (default: `AbortError`); idempotent.
    pub fn abort(&self, reason: Option<Value>) {
        abort_signal(self.signal().inner(), reason.unwrap_or_else(default_reason));
    }
}

impl fmt::Debug for AbortController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortController")
            .field("signal", &self.signal.get())
            .finish()
    }
}
