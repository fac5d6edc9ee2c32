//! # Example: basic
//!
//! Demonstrates the synchronous event and abort primitives.
//!
//! Shows how to:
//! - Register listeners on an [`EventTarget`] and dispatch a cancelable event.
//! - Abort an [`AbortController`] and observe the trusted `"abort"` event.
//! - Compose signals with [`AbortSignal::any`].
//! - Bind a listener's lifetime to a signal.
//!
//! ## Flow
//! ```text
//! controller.abort("user")
//!     ├─► signal.aborted = true, reason = "user"
//!     ├─► "abort" listeners (onabort, add_event_listener)
//!     ├─► listeners bound with `signal` option are removed
//!     └─► composite any([signal, other]) aborts with the same reason
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use abortable::{
    AbortController, AbortSignal, AddEventListenerOptions, Event, EventInit, EventTarget,
    Listener, Value,
};

fn main() -> anyhow::Result<()> {
    // === Plain event target ===
    let target = EventTarget::new();
    let veto = Listener::new(|ev: &Event| {
        println!("[target] got {:?}, vetoing", ev.event_type());
        ev.prevent_default();
    });
    target.add_event_listener("save", &veto, Default::default());

    let save = Event::new("save", EventInit { cancelable: true, ..Default::default() })?;
    let proceed = target.dispatch_event(&save)?;
    println!("[target] proceed with save: {proceed}");

    // === Controller and signal ===
    let controller = AbortController::new();
    let signal = controller.signal().clone();
    signal.set_onabort(Some(Listener::new(|ev: &Event| {
        println!("[signal] onabort (trusted={})", ev.is_trusted());
    })));

    let tick = Listener::new(|_: &Event| println!("[target] tick"));
    target.add_event_listener("tick", &tick, AddEventListenerOptions::new().with_signal(&signal));

    // === Composition ===
    let other = AbortController::new();
    let either = AbortSignal::any(&[signal.clone(), other.signal().clone()]);
    either.add_event_listener(
        "abort",
        &Listener::new(|_: &Event| println!("[any] composite aborted")),
        Default::default(),
    );

    target.dispatch_event(&Event::new("tick", EventInit::default())?)?;
    controller.abort(Some(Value::from("user")));
    target.dispatch_event(&Event::new("tick", EventInit::default())?)?;

    println!(
        "[any] aborted={} reason={}",
        either.aborted(),
        either.reason().map(|r| r.to_string()).unwrap_or_default()
    );
    if let Err(reason) = signal.throw_if_aborted() {
        println!("[signal] throw_if_aborted -> {reason}");
    }
    Ok(())
}
