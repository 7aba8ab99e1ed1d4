//! Error types for the singleton registry.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Error produced by a payload constructor or lifecycle hook.
pub type HookError = Box<dyn Error + Send + Sync + 'static>;

/// Result type returned by payload constructors and lifecycle hooks.
///
/// # Examples
///
/// ```rust
/// use ferrous_lifecycle::HookResult;
///
/// fn open_cache(path: &str) -> HookResult<Vec<u8>> {
///     if path.is_empty() {
///         return Err("empty cache path".into());
///     }
///     Ok(Vec::new())
/// }
///
/// assert!(open_cache("").is_err());
/// ```
pub type HookResult<T = ()> = Result<T, HookError>;

/// Singleton lifecycle errors
///
/// Every condition the registry treats as fatal for a single request is
/// reported as one of these variants to the caller that triggered it, and
/// to the registered observers.
///
/// # Examples
///
/// ```rust
/// use ferrous_lifecycle::SingletonError;
///
/// let reentrant = SingletonError::ReentrantConstruction("app::TextureCache");
/// assert_eq!(
///     reentrant.to_string(),
///     "Reentrant construction of app::TextureCache from its own constructor"
/// );
///
/// let uninit = SingletonError::UninitializedParamAccess("app::Settings");
/// println!("Error: {}", uninit);
/// ```
#[derive(Debug, Clone)]
pub enum SingletonError {
    /// Accessor invoked from the type's own constructor
    ReentrantConstruction(&'static str),
    /// Param singleton accessed before `init_with`
    UninitializedParamAccess(&'static str),
    /// `init_with` called on an already constructed param singleton
    DoubleInitialization(&'static str),
    /// Param singleton accessed after it was deleted
    AccessAfterDelete(&'static str),
    /// Payload constructor failed
    ConstructorFailed {
        name: &'static str,
        source: Arc<dyn Error + Send + Sync + 'static>,
    },
    /// Post-construction hook failed
    HookFailed {
        name: &'static str,
        source: Arc<dyn Error + Send + Sync + 'static>,
    },
    /// Same type used both as an implicit and a param singleton
    KindMismatch(&'static str),
    /// Nested construction exceeded the configured depth
    DepthExceeded(usize),
    /// The main thread dropped the construction request
    DispatchFailed(&'static str),
    /// Dependency graph export failed
    Export(String),
}

impl SingletonError {
    pub(crate) fn constructor_failed(name: &'static str, source: HookError) -> Self {
        SingletonError::ConstructorFailed { name, source: Arc::from(source) }
    }

    pub(crate) fn hook_failed(name: &'static str, source: HookError) -> Self {
        SingletonError::HookFailed { name, source: Arc::from(source) }
    }

    /// Type name of the singleton the error refers to, when there is one.
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            SingletonError::ReentrantConstruction(name)
            | SingletonError::UninitializedParamAccess(name)
            | SingletonError::DoubleInitialization(name)
            | SingletonError::AccessAfterDelete(name)
            | SingletonError::KindMismatch(name)
            | SingletonError::DispatchFailed(name) => Some(name),
            SingletonError::ConstructorFailed { name, .. }
            | SingletonError::HookFailed { name, .. } => Some(name),
            SingletonError::DepthExceeded(_) | SingletonError::Export(_) => None,
        }
    }
}

impl fmt::Display for SingletonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingletonError::ReentrantConstruction(name) => {
                write!(f, "Reentrant construction of {} from its own constructor", name)
            }
            SingletonError::UninitializedParamAccess(name) => {
                write!(f, "Param singleton {} accessed before init_with", name)
            }
            SingletonError::DoubleInitialization(name) => {
                write!(f, "Param singleton {} initialized twice", name)
            }
            SingletonError::AccessAfterDelete(name) => {
                write!(f, "Param singleton {} accessed after deletion", name)
            }
            SingletonError::ConstructorFailed { name, source } => {
                write!(f, "Constructor of {} failed: {}", name, source)
            }
            SingletonError::HookFailed { name, source } => {
                write!(f, "Post-construction hook of {} failed: {}", name, source)
            }
            SingletonError::KindMismatch(name) => {
                write!(f, "{} is registered as a different singleton kind", name)
            }
            SingletonError::DepthExceeded(depth) => write!(f, "Max init depth {} exceeded", depth),
            SingletonError::DispatchFailed(name) => {
                write!(f, "Main thread dropped construction request for {}", name)
            }
            SingletonError::Export(msg) => write!(f, "Graph export failed: {}", msg),
        }
    }
}

impl Error for SingletonError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SingletonError::ConstructorFailed { source, .. }
            | SingletonError::HookFailed { source, .. } => Some(&**source as &(dyn Error + 'static)),
            _ => None,
        }
    }
}

/// Result type for registry operations
///
/// # Examples
///
/// ```rust
/// use ferrous_lifecycle::{SingletonResult, SingletonError};
///
/// fn settings_ready(ready: bool) -> SingletonResult<()> {
///     if ready {
///         Ok(())
///     } else {
///         Err(SingletonError::UninitializedParamAccess("app::Settings"))
///     }
/// }
///
/// assert!(settings_ready(true).is_ok());
/// ```
pub type SingletonResult<T> = Result<T, SingletonError>;
