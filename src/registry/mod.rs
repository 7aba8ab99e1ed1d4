//! The singleton registry.
//!
//! This module contains [`SingletonRegistry`], the owner of every slot, the
//! master list of live instances and the dependency sets used to order
//! teardown, plus its [`RegistryBuilder`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::config::RegistryConfig;
use crate::dispatch::{MainThreadDispatch, MainThreadQueue};
use crate::error::{SingletonError, SingletonResult};
use crate::internal::{init_stack, ErasedSlot, MasterList, Slot};
use crate::key::{key_of, Key};
use crate::observer::{LoggingObserver, Observers, RegistryObserver};
use crate::state::{InitState, SingletonKind};
use crate::traits::Managed;

mod construct;
mod teardown;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Registry of lazily constructed, dependency-tracked singletons.
///
/// Every type implementing [`Singleton`](crate::Singleton) or
/// [`ParamSingleton`](crate::ParamSingleton) gets at most one live instance
/// per registry. Instances are built on first use, on the main thread, and
/// whatever another singleton accesses while it is being built becomes one
/// of its dependencies. [`delete_all`](Self::delete_all) later tears
/// everything down with dependents strictly before their dependencies.
///
/// # Thread Safety
///
/// The registry is `Send + Sync` and cheap to clone (it is an `Arc`
/// internally). Reads of initialized singletons work from any thread;
/// construction requested off the main thread is handed to the main thread
/// and the requester blocks until it is done.
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::{HookResult, Managed, Singleton, SingletonRegistry};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Managed for Clock {}
/// impl Singleton for Clock {
///     fn construct(_: &SingletonRegistry) -> HookResult<Self> {
///         Ok(Clock)
///     }
/// }
///
/// struct Scheduler {
///     clock: Arc<Clock>,
/// }
/// impl Managed for Scheduler {}
/// impl Singleton for Scheduler {
///     fn construct(registry: &SingletonRegistry) -> HookResult<Self> {
///         Ok(Scheduler { clock: registry.get::<Clock>()? })
///     }
/// }
///
/// let registry = SingletonRegistry::new();
/// let scheduler = registry.get_required::<Scheduler>();
/// assert!(Arc::ptr_eq(&scheduler.clock, &registry.get_required::<Clock>()));
/// assert_eq!(registry.teardown_order().len(), 2);
///
/// registry.delete_all();
/// assert_eq!(registry.live_count(), 0);
/// ```
#[derive(Clone)]
pub struct SingletonRegistry {
    inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    /// Keys this registry's frames on the thread-local init stacks
    id: u64,
    config: RegistryConfig,
    dispatch: Arc<dyn MainThreadDispatch>,
    main_queue: Option<Arc<MainThreadQueue>>,
    slots: Mutex<AHashMap<Key, Arc<dyn ErasedSlot>>>,
    master: Mutex<MasterList>,
    observers: Observers,
}

impl SingletonRegistry {
    /// Registry with the default config, owned by the calling thread.
    ///
    /// The calling thread becomes the main thread; pump
    /// [`main_queue`](Self::main_queue) from it if other threads may trigger
    /// construction.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// The stock dispatcher, unless the builder was given a custom one.
    pub fn main_queue(&self) -> Option<Arc<MainThreadQueue>> {
        self.inner.main_queue.clone()
    }

    pub fn is_main_thread(&self) -> bool {
        self.inner.dispatch.is_main_thread()
    }

    /// Current lifecycle state of `T`.
    pub fn state<T: Managed>(&self) -> InitState {
        self.existing_slot(&key_of::<T>())
            .map_or(InitState::Uninitialized, |slot| slot.state())
    }

    /// Whether `T` is fully constructed and initialized.
    pub fn exists<T: Managed>(&self) -> bool {
        self.state::<T>() == InitState::Initialized
    }

    /// Whether `T` has been deleted (and not constructed again since).
    pub fn was_deleted<T: Managed>(&self) -> bool {
        self.state::<T>() == InitState::Deleted
    }

    /// Number of instances currently in the master list.
    pub fn live_count(&self) -> usize {
        self.inner.master.lock().len()
    }

    /// Number of singletons under construction on the calling thread.
    pub fn construction_depth(&self) -> usize {
        init_stack::depth(self.inner.id)
    }

    /// Type names `T` accessed while it was being built, in first-access order.
    ///
    /// Empty when `T` is not live.
    pub fn dependencies_of<T: Managed>(&self) -> Vec<&'static str> {
        self.inner
            .master
            .lock()
            .get(&key_of::<T>())
            .map(|entry| entry.dependencies.iter().map(Key::display_name).collect())
            .unwrap_or_default()
    }

    // ----- crate internals -----

    #[inline]
    pub(crate) fn observers(&self) -> &Observers {
        &self.inner.observers
    }

    pub(crate) fn warn(&self, message: &str) {
        self.inner.observers.warning(message);
    }

    /// Report `error` for `key` and hand it back for returning.
    pub(crate) fn fail(&self, key: &Key, error: SingletonError) -> SingletonError {
        self.inner.observers.failed(key, &error);
        error
    }

    pub(crate) fn existing_slot(&self, key: &Key) -> Option<Arc<dyn ErasedSlot>> {
        self.inner.slots.lock().get(key).cloned()
    }

    /// Typed slot for `T`, created on first use with `kind`.
    pub(crate) fn slot<T: Managed>(&self, kind: SingletonKind) -> SingletonResult<Arc<Slot<T>>> {
        let key = key_of::<T>();
        let erased = {
            let mut slots = self.inner.slots.lock();
            Arc::clone(
                slots
                    .entry(key)
                    .or_insert_with(|| Arc::new(Slot::<T>::new(kind)) as Arc<dyn ErasedSlot>),
            )
        };

        if erased.kind() != kind {
            return Err(self.fail(&key, SingletonError::KindMismatch(key.display_name())));
        }
        erased
            .into_any()
            .downcast::<Slot<T>>()
            .map_err(|_| self.fail(&key, SingletonError::KindMismatch(key.display_name())))
    }

    /// Record that whatever is being built on this thread accessed `dependency`.
    pub(crate) fn capture_dependency(&self, dependency: &Key) {
        if let Some(dependent) = init_stack::current(self.inner.id) {
            if dependent != *dependency {
                self.inner.master.lock().add_dependency(&dependent, dependency);
            }
        }
    }
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SingletonRegistry {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 && self.inner.observers.has_observers() {
            if let Some(master) = self.inner.master.try_lock() {
                if master.len() > 0 {
                    self.inner.observers.warning(&format!(
                        "registry dropped with {} live singletons; call delete_all() first",
                        master.len()
                    ));
                }
            }
        }
    }
}

impl std::fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonRegistry")
            .field("id", &self.inner.id)
            .field("live", &self.live_count())
            .finish()
    }
}

/// Builder for [`SingletonRegistry`].
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::{MainThreadQueue, RegistryConfig, SingletonRegistry};
/// use std::sync::Arc;
///
/// let queue = Arc::new(MainThreadQueue::new());
/// let registry = SingletonRegistry::builder()
///     .config(RegistryConfig::default().with_env("APP_SINGLETONS"))
///     .main_queue(queue.clone())
///     .build();
/// assert!(Arc::ptr_eq(&registry.main_queue().unwrap(), &queue));
/// ```
pub struct RegistryBuilder {
    config: RegistryConfig,
    dispatch: Option<Arc<dyn MainThreadDispatch>>,
    main_queue: Option<Arc<MainThreadQueue>>,
    observers: Vec<Arc<dyn RegistryObserver>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
            dispatch: None,
            main_queue: None,
            observers: Vec::new(),
        }
    }

    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom dispatcher, e.g. one backed by a UI event loop.
    pub fn dispatcher(mut self, dispatch: Arc<dyn MainThreadDispatch>) -> Self {
        self.dispatch = Some(dispatch);
        self.main_queue = None;
        self
    }

    /// Use an existing queue as the dispatcher.
    pub fn main_queue(mut self, queue: Arc<MainThreadQueue>) -> Self {
        self.dispatch = Some(queue.clone() as Arc<dyn MainThreadDispatch>);
        self.main_queue = Some(queue);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn RegistryObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the registry. Without a dispatcher, the calling thread becomes
    /// the main thread of a fresh [`MainThreadQueue`].
    pub fn build(self) -> SingletonRegistry {
        let (dispatch, main_queue) = match (self.dispatch, self.main_queue) {
            (Some(dispatch), queue) => (dispatch, queue),
            (None, _) => {
                let queue = Arc::new(MainThreadQueue::new());
                (queue.clone() as Arc<dyn MainThreadDispatch>, Some(queue))
            }
        };

        let mut observers = Observers::new();
        if self.config.log_events {
            observers.add(Arc::new(LoggingObserver::with_target(self.config.log_target.clone())));
        }
        for observer in self.observers {
            observers.add(observer);
        }

        SingletonRegistry {
            inner: Arc::new(RegistryInner {
                id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
                config: self.config,
                dispatch,
                main_queue,
                slots: Mutex::new(AHashMap::new()),
                master: Mutex::new(MasterList::new()),
                observers,
            }),
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
