//! Per-type slot: state machine, instance pointer and lock for one singleton type.

use std::any::Any;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::key::{key_of, Key};
use crate::observer::Observers;
use crate::registry::SingletonRegistry;
use crate::state::{InitState, SingletonKind};
use crate::traits::Managed;

/// Mutable part of a slot, guarded by the slot lock.
pub(crate) struct SlotCell<T> {
    pub(crate) state: InitState,
    pub(crate) instance: Option<Arc<T>>,
    /// Teardown hook already ran for the current instance.
    pub(crate) torn_down: bool,
}

impl<T> SlotCell<T> {
    /// Move to `to`, reporting the transition while the slot is still locked
    /// so observers see each type's transitions in order.
    pub(crate) fn advance(&mut self, key: &Key, to: InitState, observers: &Observers) {
        let from = self.state;
        self.state = to;
        if from != to {
            observers.state_changed(key, from, to);
        }
    }
}

/// Slot for exactly one singleton type.
///
/// The lock is only held for state transitions and pointer fetches, never
/// while a constructor or hook runs; reentrancy is decided from the state.
pub(crate) struct Slot<T> {
    key: Key,
    kind: SingletonKind,
    cell: Mutex<SlotCell<T>>,
}

impl<T: Managed> Slot<T> {
    pub(crate) fn new(kind: SingletonKind) -> Self {
        Self::with_key(key_of::<T>(), kind)
    }

    pub(crate) fn with_key(key: Key, kind: SingletonKind) -> Self {
        Self {
            key,
            kind,
            cell: Mutex::new(SlotCell {
                state: InitState::Uninitialized,
                instance: None,
                torn_down: false,
            }),
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, SlotCell<T>> {
        self.cell.lock()
    }

    /// Install a freshly constructed instance and enter `Initializing`.
    pub(crate) fn begin_initializing(&self, instance: Arc<T>, observers: &Observers) {
        let mut cell = self.cell.lock();
        cell.instance = Some(instance);
        cell.torn_down = false;
        cell.advance(&self.key, InitState::Initializing, observers);
    }

    pub(crate) fn commit(&self, observers: &Observers) {
        self.cell.lock().advance(&self.key, InitState::Initialized, observers);
    }

    /// Leave `Constructing` for `to` when the constructor never ran.
    pub(crate) fn roll_back(&self, to: InitState, observers: &Observers) {
        self.cell.lock().advance(&self.key, to, observers);
    }

    /// Drop whatever a failed construction left behind and enter `Deleted`.
    pub(crate) fn abandon(&self, observers: &Observers) -> Option<Arc<T>> {
        let mut cell = self.cell.lock();
        cell.advance(&self.key, InitState::Deleted, observers);
        cell.instance.take()
    }
}

/// Type-erased view of a slot, stored per master-list entry.
pub(crate) trait ErasedSlot: Send + Sync + 'static {
    fn key(&self) -> Key;
    fn kind(&self) -> SingletonKind;
    fn state(&self) -> InitState;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Run the teardown hook once for the live instance. Returns whether it ran.
    fn cleanup(&self, registry: &SingletonRegistry) -> bool;

    /// Tear down (unless already torn down), destroy and unregister the live
    /// instance. Returns whether an instance was deleted.
    fn delete(&self, registry: &SingletonRegistry) -> bool;
}

impl<T: Managed> ErasedSlot for Slot<T> {
    fn key(&self) -> Key {
        self.key
    }

    fn kind(&self) -> SingletonKind {
        self.kind
    }

    fn state(&self) -> InitState {
        self.cell.lock().state
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn cleanup(&self, registry: &SingletonRegistry) -> bool {
        let instance = {
            let mut cell = self.cell.lock();
            if cell.state != InitState::Initialized || cell.torn_down {
                return false;
            }
            cell.torn_down = true;
            cell.instance.clone()
        };

        match instance {
            Some(instance) => {
                registry.run_teardown_hook(&self.key, || instance.on_teardown(registry));
                true
            }
            None => false,
        }
    }

    fn delete(&self, registry: &SingletonRegistry) -> bool {
        let pending_hook = {
            let mut cell = self.cell.lock();
            let state = cell.state;
            if state.is_in_progress() {
                drop(cell);
                registry.warn(&format!("refusing to delete {} while it is {}", self.key, state));
                return false;
            }
            if state != InitState::Initialized {
                return false;
            }
            if cell.torn_down {
                None
            } else {
                cell.torn_down = true;
                cell.instance.clone()
            }
        };

        if let Some(instance) = pending_hook {
            registry.run_teardown_hook(&self.key, || instance.on_teardown(registry));
        }

        let instance = {
            let mut cell = self.cell.lock();
            // The hook may have deleted this singleton itself
            if cell.state != InitState::Initialized {
                return false;
            }
            cell.advance(&self.key, InitState::Deleted, registry.observers());
            cell.instance.take()
        };
        registry.forget_live(&self.key);
        drop(instance);
        registry.observers().deleted(&self.key);
        true
    }
}
