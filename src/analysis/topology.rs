use crate::graph::{ArcId, ArcSelection, Graph, NodeId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use thiserror::Error;

/// Ways in which an arc selection fails to be a rooted arborescence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeDefect {
    #[error("selection refers to arc {0} outside the graph")]
    UnknownArc(ArcId),
    #[error("root {0} has a selected incoming arc")]
    RootHasParent(NodeId),
    #[error("node {node} has {count} selected incoming arcs")]
    MultipleParents { node: NodeId, count: usize },
    #[error("selected arcs form a cycle")]
    Cycle,
    #[error("node {0} has a parent but is not connected to the root")]
    Detached(NodeId),
}

/// A petgraph view of the arcs accepted by `keep`, with node indices equal to
/// node ids and arc ids as edge weights.
fn view(graph: &Graph, mut keep: impl FnMut(ArcId) -> bool) -> DiGraph<NodeId, ArcId> {
    let mut view = DiGraph::with_capacity(graph.node_count(), graph.arc_count());
    for node in graph.nodes() {
        view.add_node(node);
    }
    for arc in graph.arcs().filter(|&arc| keep(arc)) {
        view.add_edge(
            NodeIndex::new(graph.source(arc).index()),
            NodeIndex::new(graph.target(arc).index()),
            arc,
        );
    }
    view
}

fn reachable(view: &DiGraph<NodeId, ArcId>, root: NodeId) -> Vec<bool> {
    let mut seen = vec![false; view.node_count()];
    if root.index() >= view.node_count() {
        return seen;
    }
    let mut bfs = Bfs::new(view, NodeIndex::new(root.index()));
    while let Some(n) = bfs.next(view) {
        seen[n.index()] = true;
    }
    seen
}

/// Nodes reachable from `root` over any arc, indexed by node id.
pub fn reachable_from(graph: &Graph, root: NodeId) -> Vec<bool> {
    reachable(&view(graph, |_| true), root)
}

/// Checks that `selection` is an arborescence rooted at the graph's root.
/// Nodes without a selected incoming arc are allowed and simply not covered.
pub fn validate_arborescence(graph: &Graph, selection: &ArcSelection) -> Result<(), TreeDefect> {
    if let Some(arc) = selection.selected().find(|&arc| !graph.contains_arc(arc)) {
        return Err(TreeDefect::UnknownArc(arc));
    }

    let tree = view(graph, |arc| selection[arc]);

    for node in graph.nodes() {
        let count = tree.neighbors_directed(NodeIndex::new(node.index()), petgraph::Direction::Incoming).count();
        if node == graph.root() && count > 0 {
            return Err(TreeDefect::RootHasParent(node));
        }
        if count > 1 {
            return Err(TreeDefect::MultipleParents { node, count });
        }
    }

    if petgraph::algo::is_cyclic_directed(&tree) {
        return Err(TreeDefect::Cycle);
    }

    let seen = reachable(&tree, graph.root());
    for arc in selection.selected() {
        let node = graph.target(arc);
        if !seen[node.index()] {
            return Err(TreeDefect::Detached(node));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// 0 -> 1 -> 2 and 2 -> 1, 1 -> 0, 3 isolated.
    fn sample() -> Graph {
        let mut graph = Graph::new();
        for _ in 0..4 {
            graph.add_node();
        }
        for (u, v) in [(0, 1), (1, 2), (2, 1), (1, 0)] {
            graph.add_arc(NodeId(u), NodeId(v)).unwrap();
        }
        graph
    }

    #[test]
    fn reachability_follows_arc_direction() {
        let graph = sample();
        assert_eq!(reachable_from(&graph, NodeId(0)), vec![true, true, true, false]);
        assert_eq!(reachable_from(&graph, NodeId(3)), vec![false, false, false, true]);
    }

    #[rstest]
    #[case(&[0, 1], None)]
    #[case(&[0], None)]
    #[case(&[], None)]
    #[case(&[0, 3], Some(TreeDefect::RootHasParent(NodeId(0))))]
    #[case(&[0, 2], Some(TreeDefect::MultipleParents { node: NodeId(1), count: 2 }))]
    #[case(&[1, 2], Some(TreeDefect::Cycle))]
    #[case(&[1], Some(TreeDefect::Detached(NodeId(2))))]
    fn validates_selections(#[case] arcs: &[u32], #[case] defect: Option<TreeDefect>) {
        let graph = sample();
        let mut selection = ArcSelection::new(&graph);
        for &a in arcs {
            selection[ArcId(a)] = true;
        }
        assert_eq!(validate_arborescence(&graph, &selection).err(), defect);
    }
}
