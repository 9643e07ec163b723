//! Per-thread switch that forbids touching singletons.
//!
//! Some threads (detached workers, threads that may outlive the `AtExitManager`)
//! must not reach singletons that could be destroyed under them. Such a thread
//! calls [`set_singleton_allowed`]`(false)` or holds a [`ScopedDisallowSingleton`];
//! `LazyHolder::get` then trips a debug assertion unless the creation policy sets
//! `ALLOWED_ON_RESTRICTED_THREADS`. Release builds skip the check entirely.

use std::cell::Cell;

thread_local! {
    static SINGLETON_ALLOWED: Cell<bool> = const { Cell::new(true) };
}

/// Sets whether the current thread may access singletons and returns the previous setting.
pub fn set_singleton_allowed(allowed: bool) -> bool {
    SINGLETON_ALLOWED.with(|flag| flag.replace(allowed))
}

/// Returns whether the current thread may access singletons.
pub fn singleton_allowed() -> bool {
    SINGLETON_ALLOWED.with(Cell::get)
}

/// Debug-only assertion that the current thread may access singletons.
#[inline]
pub fn assert_singleton_allowed() {
    debug_assert!(
        singleton_allowed(),
        "singletons are not allowed on this thread; \
         use a policy with ALLOWED_ON_RESTRICTED_THREADS or lift the restriction"
    );
}

/// Disallows singleton access on the current thread until dropped.
///
/// The previous setting is restored on drop, so guards nest.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton::{singleton_allowed, ScopedDisallowSingleton};
///
/// {
///     let _guard = ScopedDisallowSingleton::new();
///     assert!(!singleton_allowed());
/// }
/// assert!(singleton_allowed());
/// ```
#[must_use = "the restriction is lifted as soon as the guard is dropped"]
pub struct ScopedDisallowSingleton {
    previous: bool,
    // Tied to the thread whose flag it flipped.
    _not_send: std::marker::PhantomData<*const ()>,
}

impl ScopedDisallowSingleton {
    /// Disallows singleton access on the current thread.
    pub fn new() -> Self {
        Self {
            previous: set_singleton_allowed(false),
            _not_send: std::marker::PhantomData,
        }
    }
}

impl Default for ScopedDisallowSingleton {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopedDisallowSingleton {
    fn drop(&mut self) {
        set_singleton_allowed(self.previous);
    }
}
