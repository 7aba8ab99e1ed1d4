//! Deletion and dependency-ordered bulk teardown.

use std::panic::{self, AssertUnwindSafe};

use super::SingletonRegistry;
use crate::error::HookResult;
use crate::internal::master::{self, MasterEntry};
use crate::internal::panic_message;
use crate::key::Key;
use crate::state::InitState;
use crate::traits::Managed;

impl SingletonRegistry {
    /// Tear down and destroy `T`.
    ///
    /// Runs `T`'s teardown hook unless [`cleanup_all`](Self::cleanup_all)
    /// already ran it, then drops the registry's reference. A no-op when `T`
    /// is not initialized; refused with a warning while `T` is being built.
    pub fn delete<T: Managed>(&self) {
        if let Some(slot) = self.existing_slot(&crate::key::key_of::<T>()) {
            slot.delete(self);
        }
    }

    /// Run every live singleton's teardown hook, dependents first.
    ///
    /// Instances stay alive and accessible. Hooks run at most once per
    /// instance, so calling this twice is harmless.
    pub fn cleanup_all(&self) {
        let sequence = self.teardown_sequence(|entry| entry.slot.state() == InitState::Initialized);
        for entry in sequence {
            if !self.is_current(&entry) {
                continue;
            }
            entry.slot.cleanup(self);
        }
    }

    /// Tear down and destroy every live singleton, dependents first.
    ///
    /// Hooks may delete other singletons: entries already gone when their
    /// turn comes are skipped. Singletons constructed while the sweep runs
    /// are left alone.
    pub fn delete_all(&self) {
        let sequence = self.teardown_sequence(|_| true);
        for entry in sequence {
            if !self.is_current(&entry) {
                continue;
            }
            entry.slot.delete(self);
        }
    }

    /// Type names of the live singletons in the order
    /// [`delete_all`](Self::delete_all) would tear them down.
    pub fn teardown_order(&self) -> Vec<&'static str> {
        let snapshot = self.live_entries();
        master::plan(&snapshot)
            .order
            .into_iter()
            .map(|i| snapshot[i].key.display_name())
            .collect()
    }

    /// Snapshot the live entries accepted by `filter` and order them for
    /// teardown, reporting any cycle that had to be broken.
    fn teardown_sequence(&self, filter: impl Fn(&MasterEntry) -> bool) -> Vec<MasterEntry> {
        let snapshot: Vec<MasterEntry> = self.live_entries().into_iter().filter(|e| filter(e)).collect();

        let plan = master::plan(&snapshot);
        for cycle in &plan.cycles {
            let names: Vec<&'static str> = cycle.iter().map(|&i| snapshot[i].key.display_name()).collect();
            self.observers().dependency_cycle(&names);
        }

        let mut slots: Vec<Option<MasterEntry>> = snapshot.into_iter().map(Some).collect();
        plan.order.into_iter().filter_map(|i| slots[i].take()).collect()
    }

    pub(crate) fn live_entries(&self) -> Vec<MasterEntry> {
        self.inner.master.lock().snapshot()
    }

    fn is_current(&self, entry: &MasterEntry) -> bool {
        self.inner.master.lock().is_current(&entry.key, entry.seq)
    }

    /// Run a teardown hook, containing its failure.
    pub(crate) fn run_teardown_hook(&self, key: &Key, hook: impl FnOnce() -> HookResult) {
        match panic::catch_unwind(AssertUnwindSafe(hook)) {
            Ok(Ok(())) => self.observers().torn_down(key),
            Ok(Err(err)) => self.observers().teardown_failed(key, &err.to_string()),
            Err(payload) => self.observers().teardown_failed(key, &panic_message(&*payload)),
        }
    }

    /// Drop `key` from the master list.
    pub(crate) fn forget_live(&self, key: &Key) {
        self.inner.master.lock().remove(key);
    }
}
