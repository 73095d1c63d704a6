//! The arborescence under construction: one parent arc per attached node.

use crate::graph::{ArcId, ArcSelection, Graph, NodeId};

#[derive(Debug, Clone)]
pub struct TreeState {
    root: NodeId,
    parent: Vec<Option<ArcId>>,
    attached: Vec<bool>,
    banned: Vec<bool>,
    selection: ArcSelection,
}

impl TreeState {
    /// A tree holding only the root.
    pub fn new(graph: &Graph) -> Self {
        let mut attached = vec![false; graph.node_count()];
        if let Some(slot) = attached.get_mut(graph.root().index()) {
            *slot = true;
        }
        Self {
            root: graph.root(),
            parent: vec![None; graph.node_count()],
            attached,
            banned: vec![false; graph.arc_count()],
            selection: ArcSelection::new(graph),
        }
    }

    #[inline]
    pub fn is_attached(&self, node: NodeId) -> bool { self.attached[node.index()] }

    #[inline]
    pub fn is_banned(&self, arc: ArcId) -> bool { self.banned[arc.index()] }

    pub fn ban(&mut self, arc: ArcId) { self.banned[arc.index()] = true; }

    pub fn parent(&self, node: NodeId) -> Option<ArcId> { self.parent[node.index()] }

    pub fn selection(&self) -> &ArcSelection { &self.selection }

    #[cfg(test)]
    pub fn attached_count(&self) -> usize { self.attached.iter().filter(|&&a| a).count() }

    /// Hangs the target of `arc` below its source.
    pub fn attach(&mut self, graph: &Graph, arc: ArcId) {
        let node = graph.target(arc);
        debug_assert!(!self.attached[node.index()]);
        self.parent[node.index()] = Some(arc);
        self.attached[node.index()] = true;
        self.selection[arc] = true;
    }

    /// Replaces the parent arc of the target of `arc` by `arc`.
    pub fn reparent(&mut self, graph: &Graph, arc: ArcId) {
        let node = graph.target(arc);
        if let Some(old) = self.parent[node.index()].replace(arc) {
            self.selection[old] = false;
        }
        self.selection[arc] = true;
    }

    /// Removes `node` and everything below it from the tree, returning the
    /// removed nodes with `node` first.
    pub fn detach_subtree(&mut self, graph: &Graph, node: NodeId) -> Vec<NodeId> {
        let children = self.children(graph);
        let mut detached = vec![node];
        let mut i = 0;
        while i < detached.len() {
            let current = detached[i];
            detached.extend_from_slice(&children[current.index()]);
            i += 1;
        }

        for &n in &detached {
            if let Some(arc) = self.parent[n.index()].take() {
                self.selection[arc] = false;
            }
            self.attached[n.index()] = false;
        }
        detached
    }

    /// Child lists ordered by parent arc id.
    fn children(&self, graph: &Graph) -> Vec<Vec<NodeId>> {
        let mut children = vec![Vec::new(); self.parent.len()];
        for arc in self.selection.selected() {
            children[graph.source(arc).index()].push(graph.target(arc));
        }
        children
    }

    /// Entry and exit times of a depth-first walk from the root.
    pub fn euler_tour(&self, graph: &Graph) -> EulerTour {
        let n = self.parent.len();
        let children = self.children(graph);
        let mut tin = vec![u32::MAX; n];
        let mut tout = vec![u32::MAX; n];
        let mut clock = 0u32;

        if self.root.index() < n {
            let mut stack = vec![(self.root, 0usize)];
            tin[self.root.index()] = clock;
            while let Some(top) = stack.last_mut() {
                let node = top.0;
                match children[node.index()].get(top.1) {
                    Some(&child) => {
                        top.1 += 1;
                        clock += 1;
                        tin[child.index()] = clock;
                        stack.push((child, 0));
                    }
                    None => {
                        tout[node.index()] = clock;
                        stack.pop();
                    }
                }
            }
        }

        EulerTour { tin, tout }
    }
}

/// Subtree membership in constant time.
pub struct EulerTour {
    tin: Vec<u32>,
    tout: Vec<u32>,
}

impl EulerTour {
    /// True if `node` lies in the subtree rooted at `ancestor` (inclusive).
    pub fn is_in_subtree(&self, ancestor: NodeId, node: NodeId) -> bool {
        let (a, n) = (ancestor.index(), node.index());
        self.tin[a] != u32::MAX
            && self.tin[n] != u32::MAX
            && self.tin[a] <= self.tin[n]
            && self.tout[n] <= self.tout[a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0 -> 1 -> 2, 0 -> 3, plus a spare arc 3 -> 2.
    fn chain() -> (Graph, TreeState, Vec<ArcId>) {
        let mut graph = Graph::new();
        for _ in 0..4 {
            graph.add_node();
        }
        let arcs: Vec<_> = [(0, 1), (1, 2), (0, 3), (3, 2)]
            .iter()
            .map(|&(u, v)| graph.add_arc(NodeId(u), NodeId(v)).unwrap())
            .collect();
        let mut state = TreeState::new(&graph);
        for &arc in &arcs[..3] {
            state.attach(&graph, arc);
        }
        (graph, state, arcs)
    }

    #[test]
    fn detaching_removes_the_whole_subtree() {
        let (graph, mut state, arcs) = chain();
        let detached = state.detach_subtree(&graph, NodeId(1));

        assert_eq!(detached, vec![NodeId(1), NodeId(2)]);
        assert!(!state.is_attached(NodeId(2)));
        assert!(state.is_attached(NodeId(3)));
        assert!(!state.selection()[arcs[0]]);
        assert!(!state.selection()[arcs[1]]);
        assert_eq!(state.attached_count(), 2);
    }

    #[test]
    fn euler_tour_answers_ancestry() {
        let (graph, mut state, arcs) = chain();
        let tour = state.euler_tour(&graph);
        assert!(tour.is_in_subtree(NodeId(0), NodeId(2)));
        assert!(tour.is_in_subtree(NodeId(1), NodeId(2)));
        assert!(!tour.is_in_subtree(NodeId(3), NodeId(2)));
        assert!(!tour.is_in_subtree(NodeId(2), NodeId(1)));

        state.reparent(&graph, arcs[3]);
        assert_eq!(state.parent(NodeId(2)), Some(arcs[3]));
        assert!(!state.selection()[arcs[1]]);
        let tour = state.euler_tour(&graph);
        assert!(tour.is_in_subtree(NodeId(3), NodeId(2)));
        assert!(!tour.is_in_subtree(NodeId(1), NodeId(2)));
    }
}
