//! # Opaque shared values.
//!
//! [`Value`] is the payload type for abort reasons and `CustomEvent` details.
//! It wraps an `Arc<dyn Any + Send + Sync>`, so:
//! - cloning is cheap and preserves **identity** ([`Value::ptr_eq`]);
//! - callers recover the concrete type with [`Value::downcast_ref`];
//! - a reason handed back by `throw_if_aborted` is the very same allocation
//!   that was passed to `abort`.
//!
//! `Display` knows how to render strings and [`DomException`]s; anything else
//! renders as `<opaque value>`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::dom_exception::DomException;

/// Reference-counted, type-erased value.
#[derive(Clone)]
pub struct Value(Arc<dyn Any + Send + Sync>);

impl Value {
    /// Wraps any `Send + Sync` value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns a reference to the inner value if it is a `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Returns the string content for `&'static str` and `String` payloads.
    pub fn as_str(&self) -> Option<&str> {
        if let Some(s) = self.downcast_ref::<&'static str>() {
            Some(s)
        } else {
            self.downcast_ref::<String>().map(String::as_str)
        }
    }

    #[inline]
    pub fn as_dom_exception(&self) -> Option<&DomException> {
        self.downcast_ref::<DomException>()
    }

    /// Identity comparison: `true` iff both handles share one allocation.
    #[inline]
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&a.0), Arc::as_ptr(&b.0))
    }
}

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::new(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::new(s)
    }
}

impl From<DomException> for Value {
    fn from(e: DomException) -> Self {
        Value::new(e)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.as_str() {
            f.write_str(s)
        } else if let Some(e) = self.as_dom_exception() {
            fmt::Display::fmt(e, f)
        } else {
            f.write_str("<opaque value>")
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.as_str() {
            f.debug_tuple("Value").field(&s).finish()
        } else if let Some(e) = self.as_dom_exception() {
            f.debug_tuple("Value").field(e).finish()
        } else {
            f.write_str("Value(<opaque>)")
        }
    }
}

impl std::error::Error for Value {}
