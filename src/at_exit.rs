//! Ordered shutdown callbacks.
//!
//! An [`AtExitManager`] is a scoped object, usually created at the top of `main`.
//! While it is alive, callbacks registered with [`AtExitManager::register_callback`]
//! are queued on it; when it is dropped (or flushed with
//! [`AtExitManager::process_callbacks_now`]) they run in reverse registration order,
//! each at most once.
//!
//! Managers stack: creating a second one shadows the first until it is dropped,
//! which lets a test run its own shutdown without touching the process-wide one.
//!
//! Creating a manager is `unsafe`: running its callbacks frees instances that
//! [`LazyHolder::get`](crate::LazyHolder::get) handed out as `&'static` references.
//! See [`AtExitManager::new`].
//!
//! # Examples
//!
//! ```rust
//! use lazy_singleton::AtExitManager;
//! use std::sync::{Arc, Mutex};
//!
//! let order = Arc::new(Mutex::new(Vec::new()));
//! {
//!     // SAFETY: the callbacks below do not destroy any singleton.
//!     let _exit_manager = unsafe { AtExitManager::new() };
//!     for i in 0..3 {
//!         let order = order.clone();
//!         AtExitManager::register_callback(move || order.lock().unwrap().push(i)).unwrap();
//!     }
//! }
//! assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};

use crate::trace::emit_event;
use crate::{AtExitError, SingletonEvent};

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Callbacks queued on one live manager.
struct Frame {
    id: u64,
    callbacks: Vec<Callback>,
}

/// Stack of live managers; the last frame receives registrations.
static FRAMES: LazyLock<Mutex<Vec<Frame>>> = LazyLock::new(|| Mutex::new(Vec::new()));

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Runs registered callbacks in LIFO order when dropped.
#[must_use = "callbacks run as soon as the manager is dropped"]
pub struct AtExitManager {
    id: u64,
}

impl AtExitManager {
    /// Creates a manager and makes it the target of new registrations.
    ///
    /// # Safety
    ///
    /// Every holder whose policy sets
    /// [`REGISTER_AT_EXIT`](crate::CreationPolicy::REGISTER_AT_EXIT) and creates its
    /// instance while this manager is the innermost one queues a callback here that
    /// frees the instance. References returned by `get` are `&'static` nonetheless,
    /// so the caller must ensure that none of them is used after this manager is
    /// dropped or [`process_callbacks_now`](Self::process_callbacks_now) runs. In
    /// practice: create the manager at the top of `main` and drop it after every
    /// other thread stopped touching singletons.
    ///
    /// ```compile_fail,E0133
    /// let _exit_manager = lazy_singleton::AtExitManager::new();
    /// ```
    pub unsafe fn new() -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        FRAMES
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(Frame {
                id,
                callbacks: Vec::new(),
            });
        Self { id }
    }

    /// Queues `callback` on the most recently created live manager.
    ///
    /// # Errors
    ///
    /// Returns [`AtExitError::NoManager`] if no manager is alive; the callback is
    /// dropped without running.
    pub fn register_callback(
        callback: impl FnOnce() + Send + 'static,
    ) -> Result<(), AtExitError> {
        let mut frames = FRAMES.lock().unwrap_or_else(|p| p.into_inner());
        let frame = frames.last_mut().ok_or(AtExitError::NoManager)?;
        frame.callbacks.push(Box::new(callback));
        Ok(())
    }

    /// Returns `true` if at least one manager is alive.
    pub fn is_active() -> bool {
        !FRAMES
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .is_empty()
    }

    /// Number of callbacks queued on this manager and not yet run.
    pub fn pending_callbacks(&self) -> usize {
        FRAMES
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .find(|frame| frame.id == self.id)
            .map_or(0, |frame| frame.callbacks.len())
    }

    /// Runs this manager's callbacks now, newest first.
    ///
    /// The registry lock is released while callbacks run, so a callback may register
    /// further callbacks; those run in the same call. Returns how many callbacks ran.
    /// An [`AtExitProcessed`](SingletonEvent::AtExitProcessed) event is emitted only
    /// when at least one did.
    pub fn process_callbacks_now(&self) -> usize {
        let mut ran = 0;
        loop {
            let batch = {
                let mut frames = FRAMES.lock().unwrap_or_else(|p| p.into_inner());
                match frames.iter_mut().find(|frame| frame.id == self.id) {
                    Some(frame) => std::mem::take(&mut frame.callbacks),
                    None => Vec::new(),
                }
            };
            if batch.is_empty() {
                break;
            }
            for callback in batch.into_iter().rev() {
                callback();
                ran += 1;
            }
        }

        if ran > 0 {
            emit_event(&SingletonEvent::AtExitProcessed { callbacks: ran });
        }
        ran
    }
}

impl Drop for AtExitManager {
    fn drop(&mut self) {
        self.process_callbacks_now();
        FRAMES
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .retain(|frame| frame.id != self.id);
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Callback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let make = move |name: &'static str| -> Callback {
            let log = log_clone.clone();
            Box::new(move || log.lock().unwrap().push(name))
        };
        (log, make)
    }

    #[test]
    #[serial]
    fn test_register_without_manager_fails() {
        assert!(!AtExitManager::is_active());
        let result = AtExitManager::register_callback(|| {});
        assert_eq!(result, Err(AtExitError::NoManager));
    }

    #[test]
    #[serial]
    fn test_callbacks_run_in_reverse_order() {
        let (log, make) = recorder();
        {
            // SAFETY: no singleton reference is used after this manager runs.
            let manager = unsafe { AtExitManager::new() };
            AtExitManager::register_callback(make("first")).unwrap();
            AtExitManager::register_callback(make("second")).unwrap();
            AtExitManager::register_callback(make("third")).unwrap();
            assert_eq!(manager.pending_callbacks(), 3);
        }
        assert_eq!(*log.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[test]
    #[serial]
    fn test_process_callbacks_now_runs_each_once() {
        let (log, make) = recorder();
        // SAFETY: no singleton reference is used after this manager runs.
        let manager = unsafe { AtExitManager::new() };
        AtExitManager::register_callback(make("only")).unwrap();

        assert_eq!(manager.process_callbacks_now(), 1);
        assert_eq!(manager.pending_callbacks(), 0);
        drop(manager);

        assert_eq!(*log.lock().unwrap(), vec!["only"]);
    }

    #[test]
    #[serial]
    fn test_callback_registered_during_processing_runs() {
        let (log, make) = recorder();
        // SAFETY: no singleton reference is used after this manager runs.
        let manager = unsafe { AtExitManager::new() };
        let late = make("late");
        let early = make("early");
        AtExitManager::register_callback(move || {
            early();
            AtExitManager::register_callback(late).unwrap();
        })
        .unwrap();

        assert_eq!(manager.process_callbacks_now(), 2);
        drop(manager);
        assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
    }

    #[test]
    #[serial]
    fn test_shadowing_manager_isolates_callbacks() {
        let (log, make) = recorder();
        // SAFETY: no singleton reference is used after this manager runs.
        let outer = unsafe { AtExitManager::new() };
        AtExitManager::register_callback(make("outer")).unwrap();
        {
            // SAFETY: no singleton reference is used after this manager runs.
            let inner = unsafe { AtExitManager::new() };
            AtExitManager::register_callback(make("inner")).unwrap();
            assert_eq!(inner.pending_callbacks(), 1);
            assert_eq!(outer.pending_callbacks(), 1);
        }
        assert_eq!(*log.lock().unwrap(), vec!["inner"]);

        drop(outer);
        assert_eq!(*log.lock().unwrap(), vec!["inner", "outer"]);
        assert!(!AtExitManager::is_active());
    }
}
