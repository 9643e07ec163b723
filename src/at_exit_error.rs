use std::fmt;

/// Errors returned by [`AtExitManager::register_callback`](crate::AtExitManager::register_callback).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AtExitError {
    /// No `AtExitManager` is alive, so nothing would ever run the callback.
    NoManager,
}

impl fmt::Display for AtExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtExitError::NoManager => write!(f, "No AtExitManager is alive"),
        }
    }
}

impl std::error::Error for AtExitError {}
