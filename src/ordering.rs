//! Teardown ordering over the singleton dependency graph.
//!
//! Nodes are identified by their insertion index (construction-start order).
//! Teardown must run every dependent before its dependencies so that a
//! dependency is still valid while its dependents shut down.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Result of ordering a dependency graph for teardown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeardownPlan {
    /// Every node exactly once, dependents before dependencies.
    pub order: Vec<usize>,
    /// Cycles that had to be broken, in dependency direction, each closed
    /// by repeating its first node.
    pub cycles: Vec<Vec<usize>>,
}

impl TeardownPlan {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Order nodes for teardown.
///
/// `dependencies[i]` lists the nodes node `i` depends on. Out-of-range
/// indices, duplicates and self-edges are ignored. Among nodes that are
/// free to go, the earliest inserted goes first. When every remaining node
/// still has a pending dependent, the graph holds a cycle: it is recorded
/// and its earliest-inserted member is emitted to make progress.
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::ordering::teardown_order;
///
/// // 0 depends on 1, 1 depends on 2; 3 is unrelated
/// let plan = teardown_order(&[vec![1], vec![2], vec![], vec![]]);
/// assert_eq!(plan.order, vec![0, 1, 2, 3]);
///
/// // 2 was constructed first but depends on 0
/// let plan = teardown_order(&[vec![], vec![], vec![0]]);
/// assert_eq!(plan.order, vec![1, 2, 0]);
///
/// // 0 <-> 1
/// let plan = teardown_order(&[vec![1], vec![0]]);
/// assert_eq!(plan.order, vec![0, 1]);
/// assert_eq!(plan.cycles, vec![vec![0, 1, 0]]);
/// ```
pub fn teardown_order(dependencies: &[Vec<usize>]) -> TeardownPlan {
    let n = dependencies.len();

    let deps: Vec<Vec<usize>> = dependencies
        .iter()
        .enumerate()
        .map(|(i, ds)| {
            let mut ds: Vec<usize> = ds.iter().copied().filter(|&d| d < n && d != i).collect();
            ds.sort_unstable();
            ds.dedup();
            ds
        })
        .collect();

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, ds) in deps.iter().enumerate() {
        for &d in ds {
            dependents[d].push(i);
        }
    }

    // Pending dependents per node; a node is free once it reaches zero.
    let mut pending: Vec<usize> = dependents.iter().map(Vec::len).collect();
    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&i| pending[i] == 0)
        .map(Reverse)
        .collect();
    let mut emitted = vec![false; n];
    let mut plan = TeardownPlan {
        order: Vec::with_capacity(n),
        cycles: Vec::new(),
    };

    while plan.order.len() < n {
        let next = match ready.pop() {
            Some(Reverse(i)) => i,
            None => {
                let cycle = find_cycle(&dependents, &emitted);
                let forced = cycle.iter().copied().min().unwrap_or(0);
                let mut closed: Vec<usize> = cycle;
                closed.push(closed[0]);
                plan.cycles.push(closed);
                forced
            }
        };
        if emitted[next] {
            continue;
        }
        emitted[next] = true;
        plan.order.push(next);

        for &d in &deps[next] {
            if emitted[d] {
                continue;
            }
            pending[d] -= 1;
            if pending[d] == 0 {
                ready.push(Reverse(d));
            }
        }
    }

    plan
}

/// Locate a cycle among the nodes not yet emitted.
///
/// Only called when every remaining node has an unemitted dependent, so
/// walking dependent edges from any remaining node must revisit a node.
/// Returns the cycle in dependency direction, starting at its earliest member.
fn find_cycle(dependents: &[Vec<usize>], emitted: &[bool]) -> Vec<usize> {
    let start = match emitted.iter().position(|&e| !e) {
        Some(start) => start,
        None => return Vec::new(),
    };

    let mut path: Vec<usize> = Vec::new();
    let mut position: Vec<Option<usize>> = vec![None; emitted.len()];
    let mut current = start;

    loop {
        if let Some(pos) = position[current] {
            // path[pos..] is a chain of dependent edges: each node is depended
            // on by the next. Reverse it to follow dependency edges.
            let mut cycle: Vec<usize> = path[pos..].to_vec();
            cycle.reverse();
            let min_at = cycle
                .iter()
                .enumerate()
                .min_by_key(|(_, &node)| node)
                .map_or(0, |(i, _)| i);
            cycle.rotate_left(min_at);
            return cycle;
        }
        position[current] = Some(path.len());
        path.push(current);

        match dependents[current].iter().copied().filter(|&d| !emitted[d]).min() {
            Some(next) => current = next,
            // Cannot happen when the caller's precondition holds
            None => return vec![current],
        }
    }
}
