/// Property-based tests for teardown ordering
///
/// These check the ordering guarantees over arbitrary dependency graphs
/// rather than hand-picked shapes.

use ferrous_lifecycle::ordering::teardown_order;
use proptest::prelude::*;

/// Arbitrary graph, cycles and junk edges included.
fn any_graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (0usize..24).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(0usize..n + 2, 0..5), n))
}

/// Graph whose edges only point at later nodes, so it has no cycles.
fn acyclic_graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..24).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..4), n).prop_map(move |raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, picks)| {
                    let later = n - i - 1;
                    if later == 0 {
                        return Vec::new();
                    }
                    picks.into_iter().map(|p| i + 1 + p.index(later)).collect()
                })
                .collect()
        })
    })
}

fn positions(order: &[usize]) -> Vec<usize> {
    let mut at = vec![0; order.len()];
    for (pos, &node) in order.iter().enumerate() {
        at[node] = pos;
    }
    at
}

// Property: every node is torn down exactly once, whatever the edges
proptest! {
    #[test]
    fn order_is_a_permutation(graph in any_graph()) {
        let plan = teardown_order(&graph);
        let mut sorted = plan.order.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..graph.len()).collect::<Vec<_>>());
    }
}

// Property: without cycles, dependents always precede their dependencies
proptest! {
    #[test]
    fn acyclic_graphs_respect_every_edge(graph in acyclic_graph()) {
        let plan = teardown_order(&graph);
        prop_assert!(!plan.has_cycles());

        let at = positions(&plan.order);
        for (node, deps) in graph.iter().enumerate() {
            for &dep in deps {
                prop_assert!(at[node] < at[dep], "{} must go before {}", node, dep);
            }
        }
    }
}

// Property: reported cycles are real, closed walks along dependency edges
proptest! {
    #[test]
    fn reported_cycles_are_closed_dependency_walks(graph in any_graph()) {
        let plan = teardown_order(&graph);
        for cycle in &plan.cycles {
            prop_assert!(cycle.len() >= 3);
            prop_assert_eq!(cycle.first(), cycle.last());
            for pair in cycle.windows(2) {
                prop_assert!(graph[pair[0]].contains(&pair[1]), "{} does not depend on {}", pair[0], pair[1]);
            }
        }
    }
}

// Property: the same graph always yields the same plan
proptest! {
    #[test]
    fn ordering_is_deterministic(graph in any_graph()) {
        prop_assert_eq!(teardown_order(&graph), teardown_order(&graph));
    }
}
