//! # Lazy Singleton
//!
//! A lazily-created, thread-safe single-instance holder.
//! The instance is built on first access, exactly once, no matter how many threads race for it.
//!
//! After construction, every access is a single acquire load: no lock, no allocation.
//!
//! ## Quick Start
//!
//! ```rust
//! use lazy_singleton::LazyHolder;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! static REQUESTS: LazyHolder<AtomicU64> = LazyHolder::new();
//!
//! REQUESTS.get().fetch_add(1, Ordering::Relaxed);
//! assert_eq!(REQUESTS.get().load(Ordering::Relaxed), 1);
//! ```
//!
//! ## Features
//!
//! - **Create once**: concurrent first callers race on one compare-and-swap; the loser
//!   threads wait for the winner to publish
//! - **Pluggable creation**: a [`CreationPolicy`] type decides how the instance is built,
//!   destroyed, and whether it is registered for shutdown
//! - **Ordered shutdown**: opt-in destruction through an [`AtExitManager`], last registered
//!   first destroyed
//! - **Tracing support**: optional callback for lifecycle events, off the fast path
//!
//! ## Main Items
//!
//! - [`LazyHolder`] - The holder; `get()` returns the instance
//! - [`define_singleton!`] - Declare an accessor function with a private holder
//! - [`CreationPolicy`] - How the instance is built and torn down
//! - [`AtExitManager`] - Scoped runner for shutdown callbacks
//! - [`set_trace_callback`] - Observe lifecycle events
//! - [`ScopedDisallowSingleton`] - Forbid singleton access on the current thread (debug check)

mod at_exit;
mod at_exit_error;
mod creation_policy;
mod lazy_holder;
mod macros;
mod singleton_event;
mod thread_restrictions;
mod trace;

pub use at_exit::AtExitManager;
pub use at_exit_error::AtExitError;
pub use creation_policy::{AtExitPolicy, CreationPolicy, DefaultPolicy, LeakyPolicy};
pub use lazy_holder::{InstanceState, LazyHolder};
pub use singleton_event::SingletonEvent;
pub use thread_restrictions::{
    assert_singleton_allowed, set_singleton_allowed, singleton_allowed, ScopedDisallowSingleton,
};
pub use trace::{clear_trace_callback, set_trace_callback, TraceCallback};
