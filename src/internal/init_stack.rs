//! Stack of singletons under construction, used for dependency capture.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{SingletonError, SingletonResult};
use crate::key::Key;

// One stack per registry on each thread. Construction only happens on the
// main thread, so in practice only the main thread's stacks are ever non-empty.
// A `None` frame is a barrier: nothing below it is the current dependent.
thread_local! {
    static INIT_STACKS: RefCell<HashMap<u64, Vec<Option<Key>>>> = RefCell::new(HashMap::new());
}

/// Guard for one frame of the init stack
///
/// Pushing records the stack depth beforehand; dropping truncates back to
/// that depth, so unwinding out of a constructor never leaves stale frames.
pub(crate) struct InitStackGuard {
    registry: u64,
    depth: usize,
}

impl InitStackGuard {
    pub(crate) fn push(registry: u64, key: Key, max_depth: usize) -> SingletonResult<Self> {
        INIT_STACKS.with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            let stack = stacks.entry(registry).or_default();

            let constructing = stack.iter().flatten().count();
            if constructing >= max_depth {
                return Err(SingletonError::DepthExceeded(constructing));
            }

            let depth = stack.len();
            stack.push(Some(key));
            Ok(Self { registry, depth })
        })
    }

    /// Hide the frames below from dependency capture until dropped.
    ///
    /// Used around requests forwarded from other threads: the main thread
    /// may be serving them from inside a constructor, and that constructor
    /// did not ask for them.
    pub(crate) fn barrier(registry: u64) -> Self {
        INIT_STACKS.with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            let stack = stacks.entry(registry).or_default();
            let depth = stack.len();
            stack.push(None);
            Self { registry, depth }
        })
    }
}

impl Drop for InitStackGuard {
    fn drop(&mut self) {
        // try_with: the thread-local may already be gone during thread teardown
        let _ = INIT_STACKS.try_with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            if let Some(stack) = stacks.get_mut(&self.registry) {
                stack.truncate(self.depth);
                if stack.is_empty() {
                    stacks.remove(&self.registry);
                }
            }
        });
    }
}

/// Singleton currently under construction on this thread, if any.
pub(crate) fn current(registry: u64) -> Option<Key> {
    INIT_STACKS
        .try_with(|stacks| {
            stacks
                .borrow()
                .get(&registry)
                .and_then(|stack| stack.last().copied().flatten())
        })
        .ok()
        .flatten()
}

/// Singletons under construction on this thread, barriers not counted.
pub(crate) fn depth(registry: u64) -> usize {
    INIT_STACKS
        .try_with(|stacks| {
            stacks
                .borrow()
                .get(&registry)
                .map_or(0, |stack| stack.iter().flatten().count())
        })
        .unwrap_or(0)
}
