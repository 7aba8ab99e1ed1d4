//! Accessors and the construction protocol.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use super::SingletonRegistry;
use crate::dispatch::call_on_main;
use crate::error::{HookResult, SingletonError, SingletonResult};
use crate::internal::{panic_message, InitStackGuard, Slot};
use crate::key::Key;
use crate::state::{InitState, SingletonKind};
use crate::traits::{LockedSingleton, Managed, ParamSingleton, Singleton};

/// How a constructor or hook ended when it did not succeed.
enum Failure {
    Error(crate::error::HookError),
    Panic(Box<dyn std::any::Any + Send + 'static>),
}

impl Failure {
    fn capture<R>(outcome: std::thread::Result<HookResult<R>>) -> Result<R, Failure> {
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(Failure::Error(error)),
            Err(payload) => Err(Failure::Panic(payload)),
        }
    }
}

impl SingletonRegistry {
    /// Get the implicit singleton `T`, constructing it on first use.
    ///
    /// Called from another singleton's constructor or `on_constructed` hook,
    /// `T` becomes a dependency of that singleton. Off the main thread the
    /// construction is handed to the main thread and this call blocks until
    /// it is done.
    ///
    /// A deleted `T` is constructed again (reported as a revival).
    ///
    /// # Errors
    ///
    /// * [`SingletonError::ReentrantConstruction`] when called from `T`'s own constructor
    /// * [`SingletonError::ConstructorFailed`] / [`SingletonError::HookFailed`]
    /// * [`SingletonError::DepthExceeded`] on runaway nested construction
    /// * [`SingletonError::DispatchFailed`] when the main thread dropped the request
    pub fn get<T: Singleton>(&self) -> SingletonResult<Arc<T>> {
        let slot = self.slot::<T>(SingletonKind::Implicit)?;
        let key = slot.key();
        let on_main = self.is_main_thread();

        let prior = {
            let mut cell = slot.lock();
            let state = cell.state;
            if Self::visible(state, on_main) {
                if let Some(instance) = cell.instance.clone() {
                    drop(cell);
                    self.capture_dependency(&key);
                    return Ok(instance);
                }
            }

            if !on_main {
                if state == InitState::Uninitialized {
                    cell.advance(&key, InitState::Queued, self.observers());
                }
                drop(cell);
                let registry = self.clone();
                return self.via_main(&key, move || registry.get::<T>());
            }

            if state == InitState::Constructing {
                drop(cell);
                return Err(self.fail(&key, SingletonError::ReentrantConstruction(key.display_name())));
            }
            cell.advance(&key, InitState::Constructing, self.observers());
            state
        };

        if prior == InitState::Deleted && self.inner.config.warn_on_revival {
            self.observers().revived(&key);
        }
        self.construct(&slot, prior, <T as Singleton>::construct)
    }

    /// Like [`get`](Self::get) but panics on error.
    pub fn get_required<T: Singleton>(&self) -> Arc<T> {
        match self.get::<T>() {
            Ok(instance) => instance,
            Err(err) => panic!("failed to get singleton {}: {}", std::any::type_name::<T>(), err),
        }
    }

    /// Get the param singleton `T`, which must have been built by
    /// [`init_with`](Self::init_with).
    ///
    /// # Errors
    ///
    /// * [`SingletonError::UninitializedParamAccess`] before `init_with`
    /// * [`SingletonError::AccessAfterDelete`] after deletion
    /// * [`SingletonError::ReentrantConstruction`] from `T`'s own constructor
    pub fn instance<T: ParamSingleton>(&self) -> SingletonResult<Arc<T>> {
        let slot = self.slot::<T>(SingletonKind::Param)?;
        let key = slot.key();
        let on_main = self.is_main_thread();

        let cell = slot.lock();
        let state = cell.state;
        if Self::visible(state, on_main) {
            if let Some(instance) = cell.instance.clone() {
                drop(cell);
                self.capture_dependency(&key);
                return Ok(instance);
            }
        }
        drop(cell);

        let name = key.display_name();
        match state {
            InitState::Uninitialized | InitState::Queued => {
                Err(self.fail(&key, SingletonError::UninitializedParamAccess(name)))
            }
            InitState::Deleted => Err(self.fail(&key, SingletonError::AccessAfterDelete(name))),
            InitState::Constructing if on_main => {
                Err(self.fail(&key, SingletonError::ReentrantConstruction(name)))
            }
            // Still being built on the main thread; wait for it there
            _ => {
                let registry = self.clone();
                self.via_main(&key, move || registry.instance::<T>())
            }
        }
    }

    /// Like [`instance`](Self::instance) but panics on error.
    pub fn instance_required<T: ParamSingleton>(&self) -> Arc<T> {
        match self.instance::<T>() {
            Ok(instance) => instance,
            Err(err) => panic!("failed to get singleton {}: {}", std::any::type_name::<T>(), err),
        }
    }

    /// Construct the param singleton `T` from `args`.
    ///
    /// # Errors
    ///
    /// * [`SingletonError::DoubleInitialization`] when `T` already exists
    /// * [`SingletonError::AccessAfterDelete`] when `T` was deleted
    /// * [`SingletonError::ConstructorFailed`] / [`SingletonError::HookFailed`]
    pub fn init_with<T: ParamSingleton>(&self, args: T::Args) -> SingletonResult<Arc<T>> {
        let slot = self.slot::<T>(SingletonKind::Param)?;
        let key = slot.key();
        let on_main = self.is_main_thread();
        let name = key.display_name();

        {
            let mut cell = slot.lock();
            let state = cell.state;
            match state {
                InitState::Uninitialized | InitState::Queued => {}
                InitState::Deleted => {
                    drop(cell);
                    return Err(self.fail(&key, SingletonError::AccessAfterDelete(name)));
                }
                InitState::Constructing if on_main => {
                    drop(cell);
                    return Err(self.fail(&key, SingletonError::ReentrantConstruction(name)));
                }
                _ => {
                    drop(cell);
                    return Err(self.fail(&key, SingletonError::DoubleInitialization(name)));
                }
            }

            if !on_main {
                cell.advance(&key, InitState::Queued, self.observers());
                drop(cell);
                let registry = self.clone();
                return self.via_main(&key, move || registry.init_with::<T>(args));
            }
            cell.advance(&key, InitState::Constructing, self.observers());
        }

        self.construct(&slot, InitState::Uninitialized, move |registry| {
            <T as ParamSingleton>::construct(args, registry)
        })
    }

    /// Construct the argument-less param singleton `T`.
    pub fn init<T: LockedSingleton>(&self) -> SingletonResult<Arc<T>> {
        self.init_with::<T>(())
    }

    /// Whether a slot in `state` hands out its instance to a caller on this thread.
    ///
    /// Only the main thread may see an instance whose hook is still running.
    #[inline]
    fn visible(state: InitState, on_main: bool) -> bool {
        state == InitState::Initialized || (on_main && state == InitState::Initializing)
    }

    /// Run an accessor on the main thread and capture the dependency here.
    ///
    /// The main thread may pick the job up while it is itself inside a
    /// constructor, so the accessor runs behind an init-stack barrier.
    fn via_main<T, F>(&self, key: &Key, access: F) -> SingletonResult<Arc<T>>
    where
        T: Managed,
        F: FnOnce() -> SingletonResult<Arc<T>> + Send + 'static,
    {
        let id = self.inner.id;
        let forwarded = move || {
            let _barrier = InitStackGuard::barrier(id);
            access()
        };
        let instance = call_on_main(&*self.inner.dispatch, key.display_name(), forwarded)
            .map_err(|err| self.fail(key, err))??;
        self.capture_dependency(key);
        Ok(instance)
    }

    /// Build `slot`'s payload with `build` and run its `on_constructed` hook.
    ///
    /// The slot must already be `Constructing` and the caller on the main
    /// thread. `prior` is where the slot goes back to if the depth limit
    /// stops construction before `build` runs.
    fn construct<T, F>(&self, slot: &Arc<Slot<T>>, prior: InitState, build: F) -> SingletonResult<Arc<T>>
    where
        T: Managed,
        F: FnOnce(&SingletonRegistry) -> HookResult<T>,
    {
        let key = slot.key();
        let name = key.display_name();

        let guard = match InitStackGuard::push(self.inner.id, key, self.inner.config.max_init_depth) {
            Ok(guard) => guard,
            Err(err) => {
                let restore = match prior {
                    InitState::Deleted => InitState::Deleted,
                    _ => InitState::Uninitialized,
                };
                slot.roll_back(restore, self.observers());
                return Err(self.fail(&key, err));
            }
        };

        let started = Instant::now();
        self.observers().constructing(&key);
        self.inner.master.lock().insert(key, slot.clone());

        let built = panic::catch_unwind(AssertUnwindSafe(|| build(self)));
        let instance = match Failure::capture(built) {
            Ok(value) => Arc::new(value),
            Err(failure) => {
                drop(guard);
                self.discard(slot);
                return Err(self.report(&key, failure, |source| {
                    SingletonError::constructor_failed(name, source)
                }));
            }
        };

        slot.begin_initializing(Arc::clone(&instance), self.observers());
        let hooked = panic::catch_unwind(AssertUnwindSafe(|| instance.on_constructed(self)));
        if let Err(failure) = Failure::capture(hooked) {
            drop(guard);
            self.discard(slot);
            self.run_teardown_hook(&key, || instance.on_teardown(self));
            return Err(self.report(&key, failure, |source| SingletonError::hook_failed(name, source)));
        }

        slot.commit(self.observers());
        drop(guard);
        self.observers().constructed(&key, started.elapsed());
        self.capture_dependency(&key);
        Ok(instance)
    }

    /// Forget whatever a failed construction left behind.
    fn discard<T: Managed>(&self, slot: &Slot<T>) {
        let leftover = slot.abandon(self.observers());
        self.forget_live(&slot.key());
        drop(leftover);
    }

    /// Turn a failure into the error to return, or resume its panic.
    fn report(
        &self,
        key: &Key,
        failure: Failure,
        wrap: impl FnOnce(crate::error::HookError) -> SingletonError,
    ) -> SingletonError {
        match failure {
            Failure::Error(source) => self.fail(key, wrap(source)),
            Failure::Panic(payload) => {
                self.observers().failed(key, &wrap(panic_message(&*payload).into()));
                panic::resume_unwind(payload)
            }
        }
    }
}
