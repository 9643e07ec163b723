//! Strategies describing how a lazily-created instance is built and torn down.
//!
//! A policy is a type, not a value: `LazyHolder<T, P>` calls `P::create()` and
//! `P::destroy()` directly, so the choice is fixed at compile time and costs no
//! dynamic dispatch. Only `create` has to be provided; everything else has a
//! default.

use std::marker::PhantomData;

/// Core trait defining how a singleton is created and destroyed.
///
/// # Contract
///
/// - `create` is called exactly once per holder, by exactly one thread, while every
///   other caller waits. It must not panic: a panicking `create` aborts the process.
/// - `destroy` is called at most once, and only if `REGISTER_AT_EXIT` is `true` and an
///   `AtExitManager` was alive when the instance was created.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton::{CreationPolicy, LazyHolder};
///
/// struct Greeting(String);
///
/// struct GreetingPolicy;
///
/// impl CreationPolicy<Greeting> for GreetingPolicy {
///     fn create() -> Greeting {
///         Greeting("hello".to_string())
///     }
/// }
///
/// static GREETING: LazyHolder<Greeting, GreetingPolicy> = LazyHolder::new();
///
/// assert_eq!(GREETING.get().0, "hello");
/// ```
pub trait CreationPolicy<T> {
    /// Queue `destroy` on the current `AtExitManager` right after creation.
    ///
    /// Off by default: a leaked instance cannot be used after destruction by a
    /// thread that is still running during shutdown. When on, references handed out
    /// by `get` are only valid until the manager runs; see
    /// [`AtExitManager::new`](crate::AtExitManager::new).
    const REGISTER_AT_EXIT: bool = false;

    /// Permit access from threads that called `set_singleton_allowed(false)`.
    ///
    /// Only checked in debug builds.
    const ALLOWED_ON_RESTRICTED_THREADS: bool = false;

    /// Builds the instance.
    fn create() -> T;

    /// Tears the instance down at orderly shutdown.
    fn destroy(instance: T) {
        drop(instance);
    }
}

/// Default-constructs the instance and leaks it at shutdown.
///
/// This is the policy `LazyHolder<T>` uses when none is given.
pub struct DefaultPolicy<T>(PhantomData<fn() -> T>);

impl<T: Default> CreationPolicy<T> for DefaultPolicy<T> {
    fn create() -> T {
        T::default()
    }
}

/// Default-constructs the instance and destroys it when the `AtExitManager` runs.
pub struct AtExitPolicy<T>(PhantomData<fn() -> T>);

impl<T: Default> CreationPolicy<T> for AtExitPolicy<T> {
    const REGISTER_AT_EXIT: bool = true;

    fn create() -> T {
        T::default()
    }
}

/// Default-constructs the instance, never destroys it, and may be used from any thread.
///
/// Suited to instances that have to stay reachable from threads which outlive
/// orderly shutdown.
pub struct LeakyPolicy<T>(PhantomData<fn() -> T>);

impl<T: Default> CreationPolicy<T> for LeakyPolicy<T> {
    const ALLOWED_ON_RESTRICTED_THREADS: bool = true;

    fn create() -> T {
        T::default()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
