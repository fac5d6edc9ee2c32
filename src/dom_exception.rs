//! # DOMException-style error values.
//!
//! [`DomException`] is the value used for the runtime's own abort reasons:
//! - [`DomException::abort_error`]: default reason of `AbortController::abort`
//!   and `AbortSignal::abort` (`AbortError`, legacy code 20);
//! - [`DomException::timeout_error`]: reason installed by `AbortSignal::timeout`
//!   (`TimeoutError`, legacy code 23).
//!
//! The legacy numeric `code` is derived from the name using the fixed table
//! below; names outside the table have code `0`.

use std::fmt;

/// Legacy error names and their numeric codes.
const LEGACY_CODES: &[(&str, u16)] = &[
    ("IndexSizeError", 1),
    ("DOMStringSizeError", 2),
    ("HierarchyRequestError", 3),
    ("WrongDocumentError", 4),
    ("InvalidCharacterError", 5),
    ("NoDataAllowedError", 6),
    ("NoModificationAllowedError", 7),
    ("NotFoundError", 8),
    ("NotSupportedError", 9),
    ("InUseAttributeError", 10),
    ("InvalidStateError", 11),
    ("SyntaxError", 12),
    ("InvalidModificationError", 13),
    ("NamespaceError", 14),
    ("InvalidAccessError", 15),
    ("ValidationError", 16),
    ("TypeMismatchError", 17),
    ("SecurityError", 18),
    ("NetworkError", 19),
    ("AbortError", 20),
    ("URLMismatchError", 21),
    ("QuotaExceededError", 22),
    ("TimeoutError", 23),
    ("InvalidNodeTypeError", 24),
    ("DataCloneError", 25),
];

/// A named exception carrying a message and a legacy numeric code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomException {
    name: String,
    message: String,
    code: u16,
}

impl DomException {
    /// Creates an exception; `name` defaults to `"Error"` when empty.
    pub fn new(message: impl Into<String>, name: impl Into<String>) -> Self {
        let mut name = name.into();
        if name.is_empty() {
            name = "Error".to_string();
        }
        let code = LEGACY_CODES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
            .unwrap_or(0);
        Self {
            name,
            message: message.into(),
            code,
        }
    }

    /// The default reason for an explicit abort.
    pub fn abort_error() -> Self {
        Self::new("This operation was aborted", "AbortError")
    }

    /// The reason installed when an `AbortSignal::timeout` timer fires.
    pub fn timeout_error() -> Self {
        Self::new("The operation was aborted due to timeout", "TimeoutError")
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Legacy numeric code (`0` for names without one).
    #[inline]
    pub fn code(&self) -> u16 {
        self.code
    }
}

impl fmt::Display for DomException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for DomException {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_reasons_have_legacy_codes() {
        let abort = DomException::abort_error();
        assert_eq!(abort.name(), "AbortError");
        assert_eq!(abort.code(), 20);

        let timeout = DomException::timeout_error();
        assert_eq!(timeout.name(), "TimeoutError");
        assert_eq!(timeout.code(), 23);
    }

    #[test]
    fn test_unknown_name_has_code_zero() {
        let e = DomException::new("boom", "CustomError");
        assert_eq!(e.code(), 0);
        assert_eq!(e.to_string(), "CustomError: boom");

        let e = DomException::new("boom", "");
        assert_eq!(e.name(), "Error");
    }
}
