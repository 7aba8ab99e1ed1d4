//! Per-type lifecycle states.

use std::fmt;

/// Lifecycle state of one singleton slot
///
/// States advance along
/// `Uninitialized -> (Queued) -> Constructing -> Initializing -> Initialized`,
/// and `Deleted` is reachable from any of them through explicit deletion or a
/// failed construction.
///
/// # Examples
///
/// ```rust
/// use ferrous_lifecycle::{InitState, Managed, Singleton, SingletonRegistry, HookResult};
///
/// #[derive(Default)]
/// struct Dictionary;
/// impl Managed for Dictionary {}
/// impl Singleton for Dictionary {
///     fn construct(_: &SingletonRegistry) -> HookResult<Self> {
///         Ok(Dictionary)
///     }
/// }
///
/// let registry = SingletonRegistry::new();
/// assert_eq!(registry.state::<Dictionary>(), InitState::Uninitialized);
///
/// registry.get::<Dictionary>().unwrap();
/// assert_eq!(registry.state::<Dictionary>(), InitState::Initialized);
///
/// registry.delete::<Dictionary>();
/// assert_eq!(registry.state::<Dictionary>(), InitState::Deleted);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InitState {
    /// Never constructed
    #[default]
    Uninitialized,
    /// A non-main thread handed construction off to the main thread
    Queued,
    /// Payload constructor running
    ///
    /// Accessing the type again from the same call chain is a
    /// reentrant construction error.
    Constructing,
    /// Post-construction hook running
    ///
    /// The hook may legally ask for its own instance.
    Initializing,
    /// Steady state
    Initialized,
    /// Explicitly deleted, or construction failed
    Deleted,
}

impl InitState {
    /// Whether a slot in this state has an entry in the master list.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            InitState::Constructing | InitState::Initializing | InitState::Initialized
        )
    }

    /// Whether construction or the post-construction hook is running.
    pub fn is_in_progress(self) -> bool {
        matches!(self, InitState::Constructing | InitState::Initializing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InitState::Uninitialized => "uninitialized",
            InitState::Queued => "queued",
            InitState::Constructing => "constructing",
            InitState::Initializing => "initializing",
            InitState::Initialized => "initialized",
            InitState::Deleted => "deleted",
        }
    }
}

impl fmt::Display for InitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a singleton type comes into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingletonKind {
    /// Constructed on first access, revivable after deletion
    Implicit,
    /// Constructed only through an explicit `init_with`, never revived
    Param,
}

impl SingletonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SingletonKind::Implicit => "implicit",
            SingletonKind::Param => "param",
        }
    }
}
