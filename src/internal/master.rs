//! Master list of live singleton instances and their dependency sets.

use std::sync::Arc;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::internal::ErasedSlot;
use crate::key::Key;
use crate::ordering::{teardown_order, TeardownPlan};

/// One live instance, from the start of its construction until deletion.
#[derive(Clone)]
pub(crate) struct MasterEntry {
    pub(crate) key: Key,
    /// Construction-start sequence number; orders ties and validates snapshots.
    pub(crate) seq: u64,
    /// Singletons this one accessed during its construction or initialization.
    pub(crate) dependencies: SmallVec<[Key; 4]>,
    pub(crate) slot: Arc<dyn ErasedSlot>,
}

/// Ordered collection of live entries.
///
/// Entries stay in insertion order; removal preserves the order of the rest.
#[derive(Default)]
pub(crate) struct MasterList {
    entries: Vec<MasterEntry>,
    next_seq: u64,
}

impl MasterList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add an entry for a slot entering `Constructing`. Returns its sequence number.
    pub(crate) fn insert(&mut self, key: Key, slot: Arc<dyn ErasedSlot>) -> u64 {
        // A stale entry would break the one-entry-per-key invariant
        self.remove(&key);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(MasterEntry {
            key,
            seq,
            dependencies: SmallVec::new(),
            slot,
        });
        seq
    }

    pub(crate) fn remove(&mut self, key: &Key) -> Option<MasterEntry> {
        let pos = self.entries.iter().position(|e| e.key == *key)?;
        Some(self.entries.remove(pos))
    }

    /// Record `dependent -> dependency`. Returns false when the edge already
    /// existed or the dependent is not live.
    pub(crate) fn add_dependency(&mut self, dependent: &Key, dependency: &Key) -> bool {
        if dependent == dependency {
            return false;
        }
        match self.entries.iter_mut().find(|e| e.key == *dependent) {
            Some(entry) if !entry.dependencies.contains(dependency) => {
                entry.dependencies.push(*dependency);
                true
            }
            _ => false,
        }
    }

    /// Whether the entry captured in a snapshot is still the live one.
    pub(crate) fn is_current(&self, key: &Key, seq: u64) -> bool {
        self.entries.iter().any(|e| e.key == *key && e.seq == seq)
    }

    pub(crate) fn get(&self, key: &Key) -> Option<&MasterEntry> {
        self.entries.iter().find(|e| e.key == *key)
    }

    pub(crate) fn snapshot(&self) -> Vec<MasterEntry> {
        self.entries.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Teardown plan over a snapshot, using positions in the snapshot as node ids.
///
/// Dependencies on keys outside the snapshot are dropped.
pub(crate) fn plan(snapshot: &[MasterEntry]) -> TeardownPlan {
    let index: AHashMap<Key, usize> = snapshot.iter().enumerate().map(|(i, e)| (e.key, i)).collect();
    let dependencies: Vec<Vec<usize>> = snapshot
        .iter()
        .map(|entry| entry.dependencies.iter().filter_map(|dep| index.get(dep).copied()).collect())
        .collect();
    teardown_order(&dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::slot::tests::dummy_slot;
    use crate::key::key_of;

    struct A;
    struct B;
    struct C;

    #[test]
    fn insert_keeps_construction_order() {
        let mut list = MasterList::new();
        let a = list.insert(key_of::<A>(), dummy_slot::<A>());
        let b = list.insert(key_of::<B>(), dummy_slot::<B>());
        assert!(a < b);
        let keys: Vec<_> = list.snapshot().iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![key_of::<A>(), key_of::<B>()]);
    }

    #[test]
    fn dependencies_have_set_semantics() {
        let mut list = MasterList::new();
        list.insert(key_of::<A>(), dummy_slot::<A>());
        assert!(list.add_dependency(&key_of::<A>(), &key_of::<B>()));
        assert!(!list.add_dependency(&key_of::<A>(), &key_of::<B>()));
        assert!(!list.add_dependency(&key_of::<A>(), &key_of::<A>()));
        // dependent not live
        assert!(!list.add_dependency(&key_of::<C>(), &key_of::<A>()));
        assert_eq!(list.get(&key_of::<A>()).unwrap().dependencies.len(), 1);
    }

    #[test]
    fn reinsert_invalidates_old_snapshot() {
        let mut list = MasterList::new();
        let first = list.insert(key_of::<A>(), dummy_slot::<A>());
        list.remove(&key_of::<A>());
        assert!(!list.is_current(&key_of::<A>(), first));
        let second = list.insert(key_of::<A>(), dummy_slot::<A>());
        assert!(list.is_current(&key_of::<A>(), second));
        assert!(!list.is_current(&key_of::<A>(), first));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn plan_ignores_edges_leaving_the_snapshot() {
        let mut list = MasterList::new();
        list.insert(key_of::<A>(), dummy_slot::<A>());
        list.insert(key_of::<B>(), dummy_slot::<B>());
        list.add_dependency(&key_of::<B>(), &key_of::<A>());
        list.add_dependency(&key_of::<B>(), &key_of::<C>());
        let snapshot = list.snapshot();
        assert_eq!(plan(&snapshot).order, vec![1, 0]);

        // A filtered out: B no longer waits on anything
        let only_b: Vec<_> = snapshot.into_iter().skip(1).collect();
        assert_eq!(plan(&only_b).order, vec![0]);
    }
}
