//! Process-wide tracing hook for singleton lifecycle events.
//!
//! Every holder in the process reports to the same callback. Events are only
//! emitted on slow paths (creation, waiting, shutdown), so installing a callback
//! never touches the lock-free fast path of `LazyHolder::get`.

use std::sync::{Arc, LazyLock, Mutex};

use crate::SingletonEvent;

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives a reference to a `SingletonEvent` every time a singleton
/// changes state. It must be thread-safe because creation may happen on any thread.
pub type TraceCallback = dyn Fn(&SingletonEvent) + Send + Sync + 'static;

/// Holds an optional user-defined tracing callback.
static TRACE_CALLBACK: LazyLock<Mutex<Option<Arc<TraceCallback>>>> =
    LazyLock::new(|| Mutex::new(None));

/// Sets a tracing callback that will be invoked on every singleton lifecycle event.
///
/// Replaces any previously installed callback.
///
/// # Example
/// ```rust
/// use lazy_singleton::{set_trace_callback, clear_trace_callback};
///
/// set_trace_callback(|event| println!("[singleton-trace] {}", event));
/// clear_trace_callback();
/// ```
pub fn set_trace_callback(callback: impl Fn(&SingletonEvent) + Send + Sync + 'static) {
    let mut guard = TRACE_CALLBACK.lock().unwrap_or_else(|p| p.into_inner());
    *guard = Some(Arc::new(callback));
}

/// Clears the tracing callback (disables singleton tracing).
pub fn clear_trace_callback() {
    let mut guard = TRACE_CALLBACK.lock().unwrap_or_else(|p| p.into_inner());
    *guard = None;
}

/// Emits an event using the current callback.
///
/// The callback is cloned out of the lock before it runs, so a callback may itself
/// touch singletons (and trigger further events) without deadlocking.
pub(crate) fn emit_event(event: &SingletonEvent) {
    let callback = TRACE_CALLBACK
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .clone();
    if let Some(callback) = callback {
        callback(event);
    }
}
