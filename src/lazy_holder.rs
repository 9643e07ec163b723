//! The lazily-created single-instance holder.
//!
//! A [`LazyHolder`] is one atomic word that is at the same time the instance slot
//! and a one-shot spinlock:
//!
//! | word            | meaning                                             |
//! |-----------------|-----------------------------------------------------|
//! | `0`             | not created yet                                     |
//! | `1`             | a thread is running `create()`; others must wait    |
//! | `2`             | destroyed by its shutdown callback; terminal        |
//! | anything else   | address of the published instance                   |
//!
//! The creator publishes the address with a release store and every reader loads
//! it with acquire ordering, so the construction is fully visible before the
//! reference is used. After that, `get` is a single load and compare.
//!
//! # Examples
//!
//! ```
//! use lazy_singleton::LazyHolder;
//!
//! static NAMES: LazyHolder<Vec<String>> = LazyHolder::new();
//!
//! let first: *const Vec<String> = NAMES.get();
//! let second: *const Vec<String> = NAMES.get();
//! assert_eq!(first, second);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::Backoff;

use crate::trace::emit_event;
use crate::{AtExitManager, CreationPolicy, DefaultPolicy, SingletonEvent};

const UNCREATED: usize = 0;
const BEING_CREATED: usize = 1;
const DESTROYED: usize = 2;

/// Heap cell of a published instance.
///
/// The alignment keeps every slot address (including the dangling address of a
/// zero-sized slot) above the marker values.
#[repr(align(4))]
struct Slot<T> {
    value: T,
}

/// Snapshot of a holder's lifecycle, as returned by [`LazyHolder::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// `get` has never been called.
    Uncreated,
    /// A thread is inside `create()`.
    BeingCreated,
    /// The instance is published.
    Created,
    /// The instance was destroyed by its shutdown callback.
    Destroyed,
}

/// Holds one lazily-created instance of `T`.
///
/// - `P` decides how the instance is built and whether it is destroyed at shutdown.
/// - `Tag` only tells otherwise identical holders apart at the type level; it
///   defaults to `T`.
///
/// `get` takes `&'static self` because the returned reference, and the shutdown
/// callback, must outlive any caller. Put holders in `static` items (or use
/// [`define_singleton!`](crate::define_singleton)), or leak one with `Box::leak` to
/// hand it to a process-scoped context.
pub struct LazyHolder<T, P = DefaultPolicy<T>, Tag = T> {
    state: AtomicUsize,
    _marker: PhantomData<(*const T, fn() -> (P, Tag))>,
}

// SAFETY: the instance is shared by reference across threads (needs `Sync`) and
// may be dropped by whichever thread flushes the `AtExitManager` (needs `Send`).
// The policy and tag are never instantiated.
unsafe impl<T: Send + Sync, P, Tag> Sync for LazyHolder<T, P, Tag> {}
unsafe impl<T: Send + Sync, P, Tag> Send for LazyHolder<T, P, Tag> {}

impl<T, P, Tag> LazyHolder<T, P, Tag> {
    /// Creates an empty holder. Nothing is allocated until the first `get`.
    pub const fn new() -> Self {
        Self {
            state: AtomicUsize::new(UNCREATED),
            _marker: PhantomData,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> InstanceState {
        match self.state.load(Ordering::Acquire) {
            UNCREATED => InstanceState::Uncreated,
            BEING_CREATED => InstanceState::BeingCreated,
            DESTROYED => InstanceState::Destroyed,
            _ => InstanceState::Created,
        }
    }

    /// Returns `true` once the instance has been published and not yet destroyed.
    pub fn is_created(&self) -> bool {
        self.state() == InstanceState::Created
    }

    /// Returns the instance if it is already published. Never creates it.
    pub fn try_get(&self) -> Option<&T> {
        let value = self.state.load(Ordering::Acquire);
        if value > DESTROYED {
            // SAFETY: `value` was published by the creator's release store and is only
            // freed by the shutdown callback, which replaces it with `DESTROYED` first.
            Some(unsafe { Self::deref(value) })
        } else {
            None
        }
    }

    /// # Safety
    ///
    /// `value` must be an address published by `create_instance` that has not been
    /// reclaimed.
    #[inline]
    unsafe fn deref<'a>(value: usize) -> &'a T {
        &(*(value as *const Slot<T>)).value
    }
}

impl<T, P, Tag> LazyHolder<T, P, Tag>
where
    T: Send + Sync + 'static,
    P: CreationPolicy<T> + 'static,
    Tag: 'static,
{
    /// Returns the instance, creating it on first use.
    ///
    /// Concurrent first callers race on a compare-and-swap; the winner runs
    /// `P::create()` and every other caller waits until it publishes. All callers get
    /// the same reference.
    ///
    /// # Panics
    ///
    /// - If the instance was already destroyed by its shutdown callback.
    /// - In debug builds, if the current thread disallowed singleton access and `P`
    ///   does not set `ALLOWED_ON_RESTRICTED_THREADS`.
    ///
    /// If `P::create()` panics, the process aborts.
    ///
    /// The reference is `'static` but, when `P` sets `REGISTER_AT_EXIT`, it is only
    /// valid until the [`AtExitManager`] it registered on runs. Upholding that is the
    /// obligation taken on by the `unsafe` call to [`AtExitManager::new`].
    #[inline]
    pub fn get(&'static self) -> &'static T {
        if !P::ALLOWED_ON_RESTRICTED_THREADS {
            crate::thread_restrictions::assert_singleton_allowed();
        }

        let value = self.state.load(Ordering::Acquire);
        if value > DESTROYED {
            // SAFETY: see `try_get`.
            return unsafe { Self::deref(value) };
        }
        self.get_slow(value)
    }

    #[cold]
    fn get_slow(&'static self, observed: usize) -> &'static T {
        let observed = if observed == UNCREATED {
            match self.state.compare_exchange(
                UNCREATED,
                BEING_CREATED,
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => return self.create_instance(),
                Err(current) => current,
            }
        } else {
            observed
        };

        let value = if observed == BEING_CREATED {
            self.wait_for_instance()
        } else {
            observed
        };

        if value == DESTROYED {
            panic!(
                "singleton {} was used after its shutdown destruction",
                std::any::type_name::<T>()
            );
        }
        // SAFETY: `value` is neither a marker nor reclaimed.
        unsafe { Self::deref(value) }
    }

    /// Runs in the creation window; only the CAS winner gets here.
    fn create_instance(&'static self) -> &'static T {
        let type_name = std::any::type_name::<T>();

        let instance = match panic::catch_unwind(AssertUnwindSafe(P::create)) {
            Ok(instance) => instance,
            Err(_) => {
                // The word stays BEING_CREATED forever; waiters would never return.
                emit_event(&SingletonEvent::CreationFailed { type_name });
                std::process::abort();
            }
        };

        let slot = Box::into_raw(Box::new(Slot { value: instance }));
        self.state.store(slot as usize, Ordering::Release);
        emit_event(&SingletonEvent::Created { type_name });

        if P::REGISTER_AT_EXIT {
            // Published before queued: the callback always sees a built instance.
            match AtExitManager::register_callback(move || self.destroy_at_exit()) {
                Ok(()) => emit_event(&SingletonEvent::RegisteredAtExit { type_name }),
                Err(_) => emit_event(&SingletonEvent::RegistrationRejected { type_name }),
            }
        }

        // SAFETY: `slot` comes from `Box::into_raw` above and was just published.
        unsafe { &(*slot).value }
    }

    /// Spins, then yields, until the creator publishes. Returns the new word.
    fn wait_for_instance(&self) -> usize {
        emit_event(&SingletonEvent::Waited {
            type_name: std::any::type_name::<T>(),
        });

        let backoff = Backoff::new();
        loop {
            let value = self.state.load(Ordering::Acquire);
            if value != BEING_CREATED {
                return value;
            }
            backoff.snooze();
        }
    }

    /// Shutdown callback queued by the creator.
    ///
    /// Must not race with `get` on other threads; the caller of the unsafe
    /// `AtExitManager::new` guarantees orderly shutdown runs after they stopped using
    /// the instance.
    fn destroy_at_exit(&self) {
        let value = self.state.swap(DESTROYED, Ordering::AcqRel);
        if value <= DESTROYED {
            return;
        }

        // SAFETY: `value` came from `Box::into_raw` in `create_instance`, and the swap
        // above guarantees nobody else reclaims it.
        let slot = unsafe { Box::from_raw(value as *mut Slot<T>) };
        P::destroy(slot.value);
        emit_event(&SingletonEvent::Destroyed {
            type_name: std::any::type_name::<T>(),
        });
    }
}

impl<T, P, Tag> Default for LazyHolder<T, P, Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, Tag> fmt::Debug for LazyHolder<T, P, Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyHolder")
            .field("type_name", &std::any::type_name::<T>())
            .field("state", &self.state())
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
