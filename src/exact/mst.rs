//! Minimum spanning tree over a subset of cities.

use crate::instance::{Cost, TspInstance};

/// Cost of a minimum spanning tree over `nodes` (Prim, O(V²)).
///
/// Edge weights are read from the instance as `distance(tree_node, outside_node)`.
pub fn mst_cost(instance: &TspInstance, nodes: &[usize]) -> Cost {
    if nodes.len() < 2 {
        return 0;
    }

    let root = nodes[0];
    // (city, cheapest edge from the tree) for cities not yet in the tree
    let mut frontier: Vec<(usize, Cost)> = nodes[1..]
        .iter()
        .map(|&v| (v, instance.distance(root, v)))
        .collect();

    let mut cost = 0;
    while !frontier.is_empty() {
        let mut best = 0;
        for k in 1..frontier.len() {
            if frontier[k].1 < frontier[best].1 {
                best = k;
            }
        }

        let (u, edge) = frontier.swap_remove(best);
        cost += edge;

        for entry in frontier.iter_mut() {
            let d = instance.distance(u, entry.0);
            if d < entry.1 {
                entry.1 = d;
            }
        }
    }
    cost
}
