//! Mutates the process-wide default; kept alone in its own test binary.

use abortable::diagnostics::{self, DiagnosticKind};
use abortable::{
    default_max_listeners, set_max_listeners, Config, Event, EventTarget, Listener, MaxListeners,
};

#[test]
fn test_process_default_threshold() {
    assert_eq!(default_max_listeners(), MaxListeners::Limited(10));

    assert!(Config {
        max_listeners: MaxListeners::Limited(3),
        diagnostics_capacity: 16,
    }
    .install());
    assert_eq!(default_max_listeners(), MaxListeners::Limited(3));

    let mut rx = diagnostics::subscribe();
    let target = EventTarget::new();
    for _ in 0..4 {
        target.add_event_listener("default-cap", &Listener::new(|_: &Event| {}), Default::default());
    }
    let warned = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|d| d.kind == DiagnosticKind::MaxListenersExceeded)
        .count();
    assert_eq!(warned, 1);

    set_max_listeners(f64::INFINITY, &[]).unwrap();
    assert_eq!(default_max_listeners(), MaxListeners::Unlimited);
    assert!(set_max_listeners(-1.0, &[]).is_err());
    assert_eq!(default_max_listeners(), MaxListeners::Unlimited);
}
