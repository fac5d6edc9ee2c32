//! # Example: timeouts
//!
//! Demonstrates timer-driven aborts and the diagnostics channel.
//!
//! Shows how to:
//! - Race work against [`AbortSignal::timeout`] using [`aborted`].
//! - Hand a signal to tokio code as a `CancellationToken`.
//! - Attach the built-in [`LogWriter`] to print diagnostics.
//!
//! ## Run
//! Requires the `logging` feature to export [`LogWriter`].
//! ```bash
//! cargo run --example timeouts --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use abortable::{
    aborted, AbortSignal, Event, EventTarget, Listener, LogWriter, MaxListeners, Subscribe,
    SubscriberSet,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let mut set = SubscriberSet::new(subs);
    set.listen();

    // === Race work against a deadline ===
    let deadline = AbortSignal::timeout(50)?;
    tokio::select! {
        _ = aborted(&deadline) => {
            let reason = deadline.reason().map(|r| r.to_string()).unwrap_or_default();
            println!("[timeout] gave up: {reason}");
        }
        _ = tokio::time::sleep(Duration::from_millis(200)) => println!("[timeout] work finished"),
    }

    // === Token bridge ===
    // The signal must outlive the wait: dropping it cancels its timer.
    let short = AbortSignal::timeout(20)?;
    let token = short.cancellation_token();
    let worker = tokio::spawn(async move {
        token.cancelled().await;
        println!("[token] worker cancelled");
    });
    worker.await?;
    drop(short);

    // === Diagnostics: leak warning and listener panic ===
    let target = EventTarget::new();
    target.set_max_listeners(MaxListeners::Limited(2));
    for _ in 0..3 {
        target.add_event_listener("noisy", &Listener::new(|_: &Event| {}), Default::default());
    }
    target.add_event_listener(
        "fragile",
        &Listener::new(|_: &Event| panic!("listener bug")),
        Default::default(),
    );
    target.dispatch_event(&Event::new("fragile", Default::default())?)?;

    tokio::time::sleep(Duration::from_millis(10)).await;
    set.shutdown().await;
    Ok(())
}
