//! Lifecycle traits for singleton payloads.

use crate::error::HookResult;
use crate::registry::SingletonRegistry;

/// Lifecycle hooks shared by every singleton payload.
///
/// Both hooks default to no-ops. `on_constructed` runs on the main thread
/// right after the constructor and may ask the registry for the type's own
/// instance. `on_teardown` runs at most once per instance, from `delete`,
/// `cleanup_all` or `delete_all`; failures there are logged and contained.
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::{Managed, Singleton, SingletonRegistry, HookResult};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct SettingsStore {
///     dirty: AtomicBool,
/// }
///
/// impl Managed for SettingsStore {
///     fn on_teardown(&self, _registry: &SingletonRegistry) -> HookResult {
///         if self.dirty.swap(false, Ordering::SeqCst) {
///             println!("flushing settings");
///         }
///         Ok(())
///     }
/// }
///
/// impl Singleton for SettingsStore {
///     fn construct(_registry: &SingletonRegistry) -> HookResult<Self> {
///         Ok(SettingsStore::default())
///     }
/// }
///
/// let registry = SingletonRegistry::new();
/// registry.get_required::<SettingsStore>().dirty.store(true, Ordering::SeqCst);
/// registry.delete_all();
/// ```
pub trait Managed: Send + Sync + 'static {
    /// Post-construction hook.
    fn on_constructed(&self, _registry: &SingletonRegistry) -> HookResult {
        Ok(())
    }

    /// Teardown hook.
    fn on_teardown(&self, _registry: &SingletonRegistry) -> HookResult {
        Ok(())
    }
}

/// A singleton constructed lazily on first access.
///
/// Any call site asking the registry for `T` triggers construction. Other
/// singletons requested from inside `construct` or `on_constructed` become
/// dependencies of `T` and are torn down after it.
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::{Managed, Singleton, SingletonRegistry, HookResult};
/// use std::sync::Arc;
///
/// struct ImageDecoder;
/// impl Managed for ImageDecoder {}
/// impl Singleton for ImageDecoder {
///     fn construct(_: &SingletonRegistry) -> HookResult<Self> {
///         Ok(ImageDecoder)
///     }
/// }
///
/// struct TextureCache {
///     decoder: Arc<ImageDecoder>,
/// }
/// impl Managed for TextureCache {}
/// impl Singleton for TextureCache {
///     fn construct(registry: &SingletonRegistry) -> HookResult<Self> {
///         Ok(TextureCache { decoder: registry.get::<ImageDecoder>()? })
///     }
/// }
///
/// let registry = SingletonRegistry::new();
/// let cache = registry.get_required::<TextureCache>();
/// assert!(Arc::ptr_eq(&cache.decoder, &registry.get_required::<ImageDecoder>()));
/// assert_eq!(registry.dependencies_of::<TextureCache>().len(), 1);
/// ```
pub trait Singleton: Managed + Sized {
    /// Build the payload. Runs on the main thread.
    fn construct(registry: &SingletonRegistry) -> HookResult<Self>;
}

/// A singleton constructed only through an explicit `init_with` call.
///
/// Accessing it before initialization, initializing it twice, or accessing
/// it after deletion are all errors.
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::{Managed, ParamSingleton, SingletonRegistry, SingletonError, HookResult};
///
/// struct Viewer {
///     title: String,
/// }
/// impl Managed for Viewer {}
/// impl ParamSingleton for Viewer {
///     type Args = String;
///     fn construct(title: String, _: &SingletonRegistry) -> HookResult<Self> {
///         Ok(Viewer { title })
///     }
/// }
///
/// let registry = SingletonRegistry::new();
/// assert!(matches!(
///     registry.instance::<Viewer>(),
///     Err(SingletonError::UninitializedParamAccess(_))
/// ));
///
/// registry.init_with::<Viewer>("main".to_string()).unwrap();
/// assert_eq!(registry.instance_required::<Viewer>().title, "main");
/// ```
pub trait ParamSingleton: Managed + Sized {
    /// Arguments accepted by `init_with`.
    type Args: Send + 'static;

    /// Build the payload from its arguments. Runs on the main thread.
    fn construct(args: Self::Args, registry: &SingletonRegistry) -> HookResult<Self>;
}

/// A param singleton whose initialization takes no arguments.
///
/// For services that need a controlled startup point without per-call
/// configuration. Initialize with [`SingletonRegistry::init`].
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::{Managed, LockedSingleton, SingletonRegistry, HookResult};
///
/// struct Renderer;
/// impl Managed for Renderer {}
/// impl LockedSingleton for Renderer {
///     fn construct(_: &SingletonRegistry) -> HookResult<Self> {
///         Ok(Renderer)
///     }
/// }
///
/// let registry = SingletonRegistry::new();
/// assert!(registry.instance::<Renderer>().is_err());
/// registry.init::<Renderer>().unwrap();
/// assert!(registry.exists::<Renderer>());
/// ```
pub trait LockedSingleton: Managed + Sized {
    /// Build the payload. Runs on the main thread.
    fn construct(registry: &SingletonRegistry) -> HookResult<Self>;
}

impl<T: LockedSingleton> ParamSingleton for T {
    type Args = ();

    fn construct(_args: (), registry: &SingletonRegistry) -> HookResult<Self> {
        <T as LockedSingleton>::construct(registry)
    }
}
