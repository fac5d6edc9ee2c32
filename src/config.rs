//! # Process-wide configuration.
//!
//! Provides [`Config`], the centralized settings for the runtime, and the
//! process-wide default listener threshold used by every [`EventTarget`] that
//! has no per-target override.
//!
//! Config is used in two ways:
//! 1. **Startup**: `Config { .. }.install()` sets the default threshold and the
//!    diagnostics bus capacity before the first diagnostic is reported.
//! 2. **Runtime**: [`set_max_listeners`] adjusts the default or individual
//!    targets, mirroring `events.setMaxListeners(n, ...targets)`.
//!
//! ## Threshold values
//! - `MaxListeners::Limited(n)` → warn once when a type has more than `n` listeners
//!   (`0` means no listeners are expected, so the first one warns)
//! - `MaxListeners::Unlimited` → never warn
//! - initial process default: `Limited(10)`

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Error;
use crate::globals::Instance;

/// Sentinel stored in [`DEFAULT_MAX_LISTENERS`] for `Unlimited`.
const UNLIMITED: usize = usize::MAX;

static DEFAULT_MAX_LISTENERS: AtomicUsize = AtomicUsize::new(10);

/// Soft cap on the number of listeners per event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxListeners {
    /// Warn once when a type holds more than this many listeners.
    Limited(usize),
    /// Never warn.
    Unlimited,
}

impl MaxListeners {
    /// Returns `true` when `count` listeners exceed the threshold.
    #[inline]
    pub fn is_exceeded_by(&self, count: usize) -> bool {
        match self {
            MaxListeners::Limited(max) => count > *max,
            MaxListeners::Unlimited => false,
        }
    }

    /// Returns the numeric limit (`None` for `Unlimited`).
    #[inline]
    pub fn limit(&self) -> Option<usize> {
        match self {
            MaxListeners::Limited(max) => Some(*max),
            MaxListeners::Unlimited => None,
        }
    }

    /// Converts a JS-style number: `>= 0`, `+∞` meaning unlimited.
    ///
    /// Fractional values behave like their floor (a count can never equal 2.5).
    ///
    /// ### Errors
    /// - [`Error::InvalidArgumentValue`] for NaN and `-∞`;
    /// - [`Error::OutOfRange`] for finite negatives.
    pub fn from_f64(n: f64) -> Result<Self, Error> {
        if n.is_nan() || n == f64::NEG_INFINITY {
            return Err(Error::InvalidArgumentValue {
                name: "n",
                reason: format!("must be a non-negative number or +Infinity; received {n}"),
            });
        }
        if n < 0.0 {
            return Err(Error::OutOfRange {
                name: "n",
                range: ">= 0",
                received: format!("{n}"),
            });
        }
        if n.is_infinite() || n >= UNLIMITED as f64 {
            Ok(MaxListeners::Unlimited)
        } else {
            Ok(MaxListeners::Limited(n.floor() as usize))
        }
    }

    fn to_raw(self) -> usize {
        match self {
            MaxListeners::Limited(max) => max.min(UNLIMITED - 1),
            MaxListeners::Unlimited => UNLIMITED,
        }
    }

    fn from_raw(raw: usize) -> Self {
        if raw == UNLIMITED {
            MaxListeners::Unlimited
        } else {
            MaxListeners::Limited(raw)
        }
    }
}

impl Default for MaxListeners {
    fn default() -> Self {
        MaxListeners::Limited(10)
    }
}

impl From<usize> for MaxListeners {
    fn from(n: usize) -> Self {
        MaxListeners::Limited(n)
    }
}

/// Returns the process-wide default threshold.
pub fn default_max_listeners() -> MaxListeners {
    MaxListeners::from_raw(DEFAULT_MAX_LISTENERS.load(Ordering::Relaxed))
}

/// Replaces the process-wide default threshold.
///
/// Targets with their own override are unaffected.
pub fn set_default_max_listeners(max: MaxListeners) {
    DEFAULT_MAX_LISTENERS.store(max.to_raw(), Ordering::Relaxed);
}

/// Sets the listener threshold, like `events.setMaxListeners(n, ...targets)`.
///
/// - `targets` empty → replaces the process default;
/// - otherwise → per-target override (and re-arms that target's one-shot warning).
///
/// ### Errors
/// - [`Error::InvalidArgumentValue`] if `n` is NaN or `-∞`;
/// - [`Error::OutOfRange`] if `n` is a finite negative;
/// - [`Error::InvalidArgumentType`] if a target is not an event target.
///
/// All arguments are validated before anything changes.
pub fn set_max_listeners(n: f64, targets: &[Instance]) -> Result<(), Error> {
    let max = MaxListeners::from_f64(n)?;
    if targets.is_empty() {
        set_default_max_listeners(max);
        return Ok(());
    }

    let mut resolved = Vec::with_capacity(targets.len());
    for (i, target) in targets.iter().enumerate() {
        match target.as_event_target() {
            Some(t) => resolved.push(t),
            None => {
                return Err(Error::InvalidArgumentType {
                    name: format!("eventTargets[{i}]"),
                    expected: "EventTarget",
                    received: target.kind_name().to_string(),
                })
            }
        }
    }
    for t in resolved {
        t.set_max_listeners(max);
    }
    Ok(())
}

/// Runtime configuration.
///
/// ## Field semantics
/// - `max_listeners`: process default threshold for new warnings
/// - `diagnostics_capacity`: ring buffer size of the diagnostics bus (min 1)
#[derive(Clone, Debug)]
pub struct Config {
    /// Default max-listeners threshold.
    pub max_listeners: MaxListeners,

    /// Capacity of the diagnostics broadcast channel.
    ///
    /// Receivers that lag behind more than this many items observe `Lagged`.
    pub diagnostics_capacity: usize,
}

impl Config {
    /// Returns the diagnostics capacity clamped to a minimum of 1.
    #[inline]
    pub fn diagnostics_capacity_clamped(&self) -> usize {
        self.diagnostics_capacity.max(1)
    }

    /// Applies this configuration process-wide.
    ///
    /// Returns `false` if the diagnostics bus already existed (its capacity
    /// is then left unchanged); the threshold is applied either way.
    pub fn install(self) -> bool {
        set_default_max_listeners(self.max_listeners);
        crate::diagnostics::init_bus(self.diagnostics_capacity_clamped())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_listeners = Limited(10)`
    /// - `diagnostics_capacity = 1024`
    fn default() -> Self {
        Self {
            max_listeners: MaxListeners::default(),
            diagnostics_capacity: 1024,
        }
    }
}
