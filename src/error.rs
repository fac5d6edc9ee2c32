//! Error types raised at the API boundary of the event and abort primitives.
//!
//! This module defines one error enum, [`Error`], covering every validation
//! failure the runtime can report. All checks run **before** any state is
//! touched, so an `Err` never leaves a target or signal half-updated.
//!
//! Errors that happen *inside* listeners are not represented here: a panicking
//! listener is isolated by the dispatch loop and reported out-of-band through
//! [`diagnostics`](crate::diagnostics). Likewise, the value returned by
//! [`AbortSignal::throw_if_aborted`](crate::AbortSignal::throw_if_aborted) is the
//! stored abort reason itself, never wrapped in an [`Error`].
//!
//! Like the rest of the crate, the enum provides helper methods (`as_label`,
//! `as_message`) for logs/metrics.

use thiserror::Error;

/// # Errors produced by the runtime.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An object was constructed directly instead of through its factory.
    #[error("illegal constructor: {type_name} cannot be constructed directly")]
    IllegalConstruction {
        /// Name of the type that refused construction.
        type_name: &'static str,
    },

    /// A parameter had the wrong runtime type.
    #[error("the \"{name}\" argument must be of type {expected}; received {received}")]
    InvalidArgumentType {
        /// Parameter name (e.g. `eventTargets[1]`).
        name: String,
        /// Expected type description.
        expected: &'static str,
        /// Short description of what was received.
        received: String,
    },

    /// A parameter had the right type but a disallowed value.
    #[error("the argument \"{name}\" {reason}")]
    InvalidArgumentValue {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A required parameter was omitted.
    #[error("the \"{name}\" argument must be specified")]
    MissingArgument {
        /// Parameter name.
        name: &'static str,
    },

    /// A numeric parameter fell outside its valid domain.
    #[error("the value of \"{name}\" is out of range; it must be {range}; received {received}")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Human-readable description of the accepted range.
        range: &'static str,
        /// The rejected value, formatted.
        received: String,
    },

    /// An optional host capability required by the call is absent.
    #[error("the {method} method is not implemented: {reason}")]
    MethodNotImplemented {
        /// Method that could not run.
        method: &'static str,
        /// Missing capability.
        reason: &'static str,
    },

    /// A method was invoked on a value that is not a genuine instance.
    #[error("value of \"this\" must be of type {expected}")]
    InvalidReceiver {
        /// Expected receiver type.
        expected: &'static str,
    },

    /// The event object is already being dispatched.
    #[error("the event \"{event_type}\" is already being dispatched")]
    EventRecursion {
        /// Type of the event that was re-dispatched.
        event_type: String,
    },
}

impl Error {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use abortable::Error;
    ///
    /// let err = Error::MissingArgument { name: "type" };
    /// assert_eq!(err.as_label(), "missing_argument");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::IllegalConstruction { .. } => "illegal_construction",
            Error::InvalidArgumentType { .. } => "invalid_argument_type",
            Error::InvalidArgumentValue { .. } => "invalid_argument_value",
            Error::MissingArgument { .. } => "missing_argument",
            Error::OutOfRange { .. } => "out_of_range",
            Error::MethodNotImplemented { .. } => "method_not_implemented",
            Error::InvalidReceiver { .. } => "invalid_receiver",
            Error::EventRecursion { .. } => "event_recursion",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            Error::IllegalConstruction { type_name } => format!("illegal constructor: {type_name}"),
            Error::InvalidArgumentType { name, expected, .. } => {
                format!("invalid type for {name}: expected {expected}")
            }
            Error::InvalidArgumentValue { name, reason } => format!("invalid {name}: {reason}"),
            Error::MissingArgument { name } => format!("missing {name}"),
            Error::OutOfRange { name, received, .. } => format!("{name} out of range: {received}"),
            Error::MethodNotImplemented { method, .. } => format!("{method} not implemented"),
            Error::InvalidReceiver { expected } => format!("receiver is not a {expected}"),
            Error::EventRecursion { event_type } => format!("recursive dispatch of {event_type}"),
        }
    }

    /// Indicates whether the error was raised by argument validation.
    ///
    /// Returns `true` for the argument-shaped variants, `false` for receiver,
    /// construction, capability and dispatch-state errors.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgumentType { .. }
                | Error::InvalidArgumentValue { .. }
                | Error::MissingArgument { .. }
                | Error::OutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let err = Error::OutOfRange {
            name: "delay",
            range: ">= 0 && <= 4294967295",
            received: "-1".into(),
        };
        assert_eq!(err.as_label(), "out_of_range");
        assert!(err.is_validation());

        let err = Error::InvalidReceiver { expected: "AbortSignal" };
        assert_eq!(err.as_label(), "invalid_receiver");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_display_mentions_argument() {
        let err = Error::MissingArgument { name: "type" };
        assert_eq!(err.to_string(), "the \"type\" argument must be specified");
    }
}
