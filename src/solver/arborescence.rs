//! Minimum cost arborescences by cycle contraction (Chu-Liu/Edmonds).

use crate::analysis::reachable_from;
use crate::graph::{ArcId, ArcWeights, Graph};

const NONE: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct WeightedArc {
    source: usize,
    target: usize,
    weight: f64,
    id: ArcId,
}

impl WeightedArc {
    fn cheaper_than(&self, other: &Self) -> bool {
        self.weight.total_cmp(&other.weight).then(self.id.cmp(&other.id)).is_lt()
    }
}

/// The cheapest arborescence under `weights` spanning every node reachable
/// from the graph's root, as arc ids in ascending order. Among equally cheap
/// incoming arcs the lower id wins.
pub fn min_arborescence(graph: &Graph, weights: &ArcWeights) -> Vec<ArcId> {
    let root = graph.root();
    if !graph.contains_node(root) {
        return Vec::new();
    }

    let reachable = reachable_from(graph, root);
    let mut index = vec![NONE; graph.node_count()];
    let mut count = 0;
    for node in graph.nodes() {
        if reachable[node.index()] {
            index[node.index()] = count;
            count += 1;
        }
    }

    let arcs: Vec<WeightedArc> = graph
        .arcs()
        .filter(|&arc| reachable[graph.source(arc).index()] && reachable[graph.target(arc).index()])
        .map(|arc| WeightedArc {
            source: index[graph.source(arc).index()],
            target: index[graph.target(arc).index()],
            weight: weights[arc],
            id: arc,
        })
        .collect();

    let mut chosen: Vec<ArcId> = contract(count, index[root.index()], &arcs).into_iter().map(|i| arcs[i].id).collect();
    chosen.sort();
    chosen
}

/// Solves the instance over nodes `0..n`, returning indices into `arcs`.
/// Nodes without any incoming arc stay without parent.
fn contract(n: usize, root: usize, arcs: &[WeightedArc]) -> Vec<usize> {
    let mut best_in: Vec<Option<usize>> = vec![None; n];
    for (i, arc) in arcs.iter().enumerate() {
        if arc.source == arc.target || arc.target == root {
            continue;
        }
        if best_in[arc.target].map_or(true, |j| arc.cheaper_than(&arcs[j])) {
            best_in[arc.target] = Some(i);
        }
    }

    // Cycles of the cheapest-parent graph get components 0..cycles
    let mut component = vec![NONE; n];
    let mut walked_from = vec![NONE; n];
    let mut cycles = 0;
    for start in 0..n {
        let mut node = start;
        while node != NONE && walked_from[node] == NONE {
            walked_from[node] = start;
            node = best_in[node].map_or(NONE, |i| arcs[i].source);
        }
        if node == NONE || walked_from[node] != start || component[node] != NONE {
            continue;
        }
        let mut member = node;
        loop {
            component[member] = cycles;
            member = match best_in[member] {
                Some(i) => arcs[i].source,
                None => break,
            };
            if member == node {
                break;
            }
        }
        cycles += 1;
    }

    if cycles == 0 {
        return best_in.into_iter().flatten().collect();
    }

    let on_cycle: Vec<bool> = component.iter().map(|&c| c != NONE).collect();
    let mut next = cycles;
    for c in component.iter_mut().filter(|c| **c == NONE) {
        *c = next;
        next += 1;
    }

    // Arcs entering a cycle pay for the cycle arc they replace
    let mut reduced = Vec::new();
    let mut origin = Vec::new();
    for (i, arc) in arcs.iter().enumerate() {
        let (source, target) = (component[arc.source], component[arc.target]);
        if source == target {
            continue;
        }
        let replaced = if on_cycle[arc.target] { best_in[arc.target].map_or(0.0, |j| arcs[j].weight) } else { 0.0 };
        reduced.push(WeightedArc { source, target, weight: arc.weight - replaced, id: arc.id });
        origin.push(i);
    }

    let mut chosen: Vec<usize> = contract(next, component[root], &reduced).into_iter().map(|k| origin[k]).collect();

    let mut entered = vec![false; n];
    for &i in &chosen {
        entered[arcs[i].target] = true;
    }
    for node in 0..n {
        if on_cycle[node] && !entered[node] {
            chosen.extend(best_in[node]);
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;
    use rstest::rstest;

    fn weighted(nodes: usize, arcs: &[(u32, u32, f64)]) -> (Graph, ArcWeights) {
        let mut graph = Graph::new();
        let mut weights = ArcWeights::new(&graph);
        for _ in 0..nodes {
            graph.add_node();
        }
        for &(u, v, w) in arcs {
            let arc = graph.add_arc(NodeId(u), NodeId(v)).unwrap();
            weights[arc] = w;
        }
        (graph, weights)
    }

    #[rstest]
    // Greedy growth from the root would take 0->1 first
    #[case(3, &[(0, 1, 2.0), (0, 2, 3.0), (2, 1, 0.0)], &[1, 2])]
    // 1 and 2 prefer each other; the cycle is entered at 2
    #[case(3, &[(0, 1, 5.0), (1, 2, 1.0), (2, 1, 1.0), (0, 2, 4.0)], &[2, 3])]
    // Equal weights prefer the lower arc id
    #[case(3, &[(0, 2, 1.0), (1, 2, 1.0), (0, 1, 0.0)], &[0, 2])]
    // Nested cycles: {1, 2} contracts, then joins 3
    #[case(4, &[(0, 1, 9.0), (1, 2, 0.0), (2, 1, 0.0), (1, 3, 0.0), (3, 2, 0.0), (0, 3, 2.0), (0, 2, 3.0)], &[2, 4, 5])]
    // Unreachable nodes are left out
    #[case(4, &[(0, 1, 1.0), (2, 3, 1.0)], &[0])]
    fn finds_the_cheapest_arborescence(#[case] nodes: usize, #[case] arcs: &[(u32, u32, f64)], #[case] expected: &[u32]) {
        let (graph, weights) = weighted(nodes, arcs);
        let chosen: Vec<u32> = min_arborescence(&graph, &weights).into_iter().map(|a| a.0).collect();
        assert_eq!(chosen, expected);
    }

    #[test]
    fn empty_graph_has_no_arcs() {
        let graph = Graph::new();
        let weights = ArcWeights::new(&graph);
        assert!(min_arborescence(&graph, &weights).is_empty());
    }
}
