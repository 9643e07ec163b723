//! Macros for declaring singleton accessors.
//!
//! This module provides a macro-based way to give a type one sanctioned entry point
//! to its lazily-created instance, without exposing the holder itself.

/// Declares an accessor function backed by a private [`LazyHolder`](crate::LazyHolder).
///
/// The macro expands to a function whose body owns a function-local
/// `static LazyHolder` and returns its instance. Nothing outside that function can
/// reach the holder, so the function is the only way to the instance.
///
/// Name the instance type explicitly; `Self` cannot be used in the generated static.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton::define_singleton;
///
/// #[derive(Default)]
/// pub struct Foo {
///     calls: std::sync::atomic::AtomicUsize,
/// }
///
/// impl Foo {
///     define_singleton! {
///         /// Returns the process-wide `Foo`.
///         pub fn instance() -> Foo
///     }
///
///     pub fn bar(&self) -> usize {
///         self.calls.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1
///     }
/// }
///
/// assert_eq!(Foo::instance().bar(), 1);
/// assert_eq!(Foo::instance().bar(), 2);
/// ```
///
/// # Policies and Tags
///
/// ```rust
/// use lazy_singleton::{define_singleton, AtExitPolicy, DefaultPolicy};
///
/// pub struct ReadLock;
/// pub struct WriteLock;
///
/// define_singleton! {
///     pub fn plugin_names() -> Vec<String> where policy = AtExitPolicy<Vec<String>>
/// }
///
/// define_singleton! {
///     pub fn read_lock() -> std::sync::Mutex<()> where policy = DefaultPolicy<std::sync::Mutex<()>>, tag = ReadLock
/// }
///
/// define_singleton! {
///     pub fn write_lock() -> std::sync::Mutex<()> where policy = DefaultPolicy<std::sync::Mutex<()>>, tag = WriteLock
/// }
///
/// assert!(!std::ptr::eq(read_lock(), write_lock()));
/// ```
#[macro_export]
macro_rules! define_singleton {
    (@accessor [$($attrs:tt)*] $vis:vis $name:ident, $ty:ty, $policy:ty, $tag:ty) => {
        $($attrs)*
        $vis fn $name() -> &'static $ty {
            static HOLDER: $crate::LazyHolder<$ty, $policy, $tag> = $crate::LazyHolder::new();
            HOLDER.get()
        }
    };

    ($(#[$meta:meta])* $vis:vis fn $name:ident() -> $ty:ty where policy = $policy:ty, tag = $tag:ty $(;)?) => {
        $crate::define_singleton!(@accessor [$(#[$meta])*] $vis $name, $ty, $policy, $tag);
    };

    ($(#[$meta:meta])* $vis:vis fn $name:ident() -> $ty:ty where policy = $policy:ty $(;)?) => {
        $crate::define_singleton!(@accessor [$(#[$meta])*] $vis $name, $ty, $policy, $ty);
    };

    ($(#[$meta:meta])* $vis:vis fn $name:ident() -> $ty:ty $(;)?) => {
        $crate::define_singleton!(@accessor [$(#[$meta])*] $vis $name, $ty, $crate::DefaultPolicy<$ty>, $ty);
    };
}
