#![no_main]

use ferrous_lifecycle::ordering::teardown_order;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the node count, each following pair is an edge
    let nodes = (data[0] % 64) as usize;
    let mut graph: Vec<Vec<usize>> = vec![Vec::new(); nodes];
    if nodes > 0 {
        for pair in data[1..].chunks_exact(2) {
            let from = pair[0] as usize % nodes;
            // out-of-range targets are allowed and must be ignored
            graph[from].push(pair[1] as usize);
        }
    }

    let plan = teardown_order(&graph);

    let mut seen = vec![false; nodes];
    for &node in &plan.order {
        assert!(node < nodes);
        assert!(!seen[node], "node {} emitted twice", node);
        seen[node] = true;
    }
    assert_eq!(plan.order.len(), nodes);

    let mut at = vec![0; nodes];
    for (pos, &node) in plan.order.iter().enumerate() {
        at[node] = pos;
    }
    for cycle in &plan.cycles {
        assert_eq!(cycle.first(), cycle.last());
        for pair in cycle.windows(2) {
            assert!(graph[pair[0]].contains(&pair[1]));
        }
    }
    if !plan.has_cycles() {
        for (node, deps) in graph.iter().enumerate() {
            for &dep in deps.iter().filter(|&&d| d < nodes && d != node) {
                assert!(at[node] < at[dep]);
            }
        }
    }
});
