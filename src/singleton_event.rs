/// Lifecycle events emitted by lazily-created singletons.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// None of them is emitted on the fast path of `LazyHolder::get`; they only mark
/// the one-off transitions of an instance and the waits around them.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton::SingletonEvent;
///
/// let event = SingletonEvent::Created { type_name: "i32" };
/// println!("{:?}", event);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingletonEvent {
    /// The instance was constructed and published.
    Created {
        /// The type name of the instance (e.g., "i32", "alloc::string::String")
        type_name: &'static str,
    },

    /// A thread lost the creation race and waited for the creator to publish.
    Waited {
        /// The type name of the instance being waited on
        type_name: &'static str,
    },

    /// The creation routine panicked. The process aborts right after this event.
    CreationFailed {
        /// The type name whose construction failed
        type_name: &'static str,
    },

    /// The destroy callback was queued on the current `AtExitManager`.
    RegisteredAtExit {
        /// The type name of the registered instance
        type_name: &'static str,
    },

    /// The policy asked for shutdown registration but no `AtExitManager` was alive.
    /// The instance is leaked.
    RegistrationRejected {
        /// The type name of the leaked instance
        type_name: &'static str,
    },

    /// The instance was destroyed by its shutdown callback.
    Destroyed {
        /// The type name of the destroyed instance
        type_name: &'static str,
    },

    /// An `AtExitManager` ran its queued callbacks.
    AtExitProcessed {
        /// Number of callbacks that ran
        callbacks: usize,
    },
}

impl std::fmt::Display for SingletonEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SingletonEvent::Created { type_name } => {
                write!(f, "created {{ type_name: {} }}", type_name)
            }
            SingletonEvent::Waited { type_name } => {
                write!(f, "waited {{ type_name: {} }}", type_name)
            }
            SingletonEvent::CreationFailed { type_name } => {
                write!(f, "creation failed {{ type_name: {} }}", type_name)
            }
            SingletonEvent::RegisteredAtExit { type_name } => {
                write!(f, "registered at exit {{ type_name: {} }}", type_name)
            }
            SingletonEvent::RegistrationRejected { type_name } => {
                write!(
                    f,
                    "registration rejected {{ type_name: {} }}",
                    type_name
                )
            }
            SingletonEvent::Destroyed { type_name } => {
                write!(f, "destroyed {{ type_name: {} }}", type_name)
            }
            SingletonEvent::AtExitProcessed { callbacks } => {
                write!(f, "at exit processed {{ callbacks: {} }}", callbacks)
            }
        }
    }
}

impl SingletonEvent {
    /// Returns the type name carried by the event, if any.
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            SingletonEvent::Created { type_name }
            | SingletonEvent::Waited { type_name }
            | SingletonEvent::CreationFailed { type_name }
            | SingletonEvent::RegisteredAtExit { type_name }
            | SingletonEvent::RegistrationRejected { type_name }
            | SingletonEvent::Destroyed { type_name } => Some(type_name),
            SingletonEvent::AtExitProcessed { .. } => None,
        }
    }
}
