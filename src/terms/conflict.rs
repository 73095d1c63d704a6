//! Hard exclusivity between conflicting candidates.
//!
//! A `Conflict` arc between candidate nodes `u` and `v` yields two kinds of
//! mutually exclusive pairs:
//!
//! - every link edge at `u` excludes every link edge at `v`, so at most one of
//!   the two candidates is connected through links;
//! - two conflict arcs `x -> y` and `y -> z` with `z != x` exclude each other,
//!   so a candidate is never hung off a candidate that is itself hung off.

use super::Proposal;
use crate::error::{HostError, Result};
use crate::graph::{ArcId, ArcSelection, ArcType, ArcTypes, Edge, Graph, NodeId};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Two edges (or single arcs, as size-one edges) that must not both be selected.
///
/// Stored with `first <= second`, so equality is unordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExclusivePair {
    pub first: Edge,
    pub second: Edge,
}

impl ExclusivePair {
    pub fn new(a: Edge, b: Edge) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// The member containing `arc` and the other member.
    fn split(&self, arc: ArcId) -> (&Edge, &Edge) {
        if self.first.contains(arc) {
            (&self.first, &self.second)
        } else {
            (&self.second, &self.first)
        }
    }
}

pub struct CandidateConflictTerm {
    pairs: Vec<ExclusivePair>,
    // Pair indices per arc
    by_arc: Vec<Vec<u32>>,
}

impl CandidateConflictTerm {
    pub fn new(graph: &Graph, types: &ArcTypes) -> Result<Self> {
        let mut pairs = Vec::new();
        let mut seen = HashSet::new();

        find_exclusive_edges(graph, types, &mut pairs, &mut seen)?;
        find_conflict_arcs(graph, types, &mut pairs, &mut seen);

        let mut by_arc = vec![Vec::new(); graph.arc_count()];
        for (i, pair) in pairs.iter().enumerate() {
            for arc in pair.first.iter().chain(pair.second.iter()) {
                by_arc[arc.index()].push(i as u32);
            }
        }

        for pair in &pairs {
            trace!(first = ?pair.first.arcs(), second = ?pair.second.arcs(), "exclusive pair");
        }

        Ok(Self { pairs, by_arc })
    }

    pub fn pairs(&self) -> &[ExclusivePair] { &self.pairs }

    pub fn violations<'t>(&'t self, selection: &ArcSelection, out: &mut Vec<&'t ExclusivePair>) {
        out.extend(
            self.pairs
                .iter()
                .filter(|p| selection.contains_edge(&p.first) && selection.contains_edge(&p.second)),
        );
    }

    pub fn is_feasible(&self, selection: &ArcSelection) -> bool {
        !self
            .pairs
            .iter()
            .any(|p| selection.contains_edge(&p.first) && selection.contains_edge(&p.second))
    }

    pub fn admits(&self, proposal: &Proposal<'_>) -> bool {
        let Some(indices) = self.by_arc.get(proposal.added.index()) else {
            return true;
        };
        indices.iter().all(|&i| {
            let (_, other) = self.pairs[i as usize].split(proposal.added);
            !proposal.contains_edge(other)
        })
    }
}

/// Pairs every link edge at one end of a conflict with every link edge at the other.
fn find_exclusive_edges(
    graph: &Graph,
    types: &ArcTypes,
    pairs: &mut Vec<ExclusivePair>,
    seen: &mut HashSet<ExclusivePair>,
) -> Result<()> {
    for arc in graph.arcs() {
        if types[arc] != ArcType::Conflict {
            continue;
        }

        // consider only one direction
        let (from, to) = (graph.source(arc), graph.target(arc));
        if from >= to {
            continue;
        }

        let source_edges = link_edges(graph, types, from);
        let target_edges = link_edges(graph, types, to);

        for source_edge in &source_edges {
            for target_edge in &target_edges {
                if source_edge == target_edge {
                    return Err(HostError::ParallelLinks { from, to });
                }
                let pair = ExclusivePair::new(source_edge.clone(), target_edge.clone());
                if seen.insert(pair.clone()) {
                    pairs.push(pair);
                }
            }
        }
    }
    Ok(())
}

/// All link edges at `node`, pairing outgoing and incoming arcs to the same neighbour.
fn link_edges(graph: &Graph, types: &ArcTypes, node: NodeId) -> Vec<Edge> {
    let mut edges = Vec::new();
    let mut by_neighbour: HashMap<NodeId, usize> = HashMap::new();

    for out in graph.out_arcs(node) {
        if types[out] != ArcType::Link {
            continue;
        }
        edges.push(Edge::from_arc(out));
        by_neighbour.insert(graph.target(out), edges.len() - 1);
    }

    for incoming in graph.in_arcs(node) {
        if types[incoming] != ArcType::Link {
            continue;
        }
        match by_neighbour.get(&graph.source(incoming)) {
            Some(&i) => edges[i].add_arc(incoming),
            None => edges.push(Edge::from_arc(incoming)),
        }
    }

    edges
}

/// Chains of two conflict arcs `x -> y -> z` (with `z != x`) are exclusive.
fn find_conflict_arcs(
    graph: &Graph,
    types: &ArcTypes,
    pairs: &mut Vec<ExclusivePair>,
    seen: &mut HashSet<ExclusivePair>,
) {
    for arc in graph.arcs() {
        if types[arc] != ArcType::Conflict {
            continue;
        }
        for out in graph.out_arcs(graph.target(arc)) {
            if types[out] == ArcType::Conflict && graph.target(out) != graph.source(arc) {
                let pair = ExclusivePair::new(Edge::from_arc(arc), Edge::from_arc(out));
                if seen.insert(pair.clone()) {
                    pairs.push(pair);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Root 0 linked to candidates 1, 2, 3; candidate 1 conflicts with 2 and 3.
    /// Arc ids: links 0..3, conflicts 3..5, link opposites 5..8, conflict opposites 8..10.
    fn conflict_star() -> (Graph, ArcTypes) {
        let mut graph = Graph::new();
        let mut types = ArcTypes::new(&graph);
        let nodes: Vec<_> = (0..4).map(|_| graph.add_node()).collect();

        let mut add = |graph: &mut Graph, u: usize, v: usize, kind: ArcType| {
            let arc = graph.add_arc(nodes[u], nodes[v]).unwrap();
            types[arc] = kind;
        };
        add(&mut graph, 0, 1, ArcType::Link);
        add(&mut graph, 0, 2, ArcType::Link);
        add(&mut graph, 0, 3, ArcType::Link);
        add(&mut graph, 1, 2, ArcType::Conflict);
        add(&mut graph, 1, 3, ArcType::Conflict);
        add(&mut graph, 1, 0, ArcType::Link);
        add(&mut graph, 2, 0, ArcType::Link);
        add(&mut graph, 3, 0, ArcType::Link);
        add(&mut graph, 2, 1, ArcType::Conflict);
        add(&mut graph, 3, 1, ArcType::Conflict);
        (graph, types)
    }

    fn edge(arcs: &[u32]) -> Edge {
        let mut edge = Edge::from_arc(ArcId(arcs[0]));
        for &a in &arcs[1..] {
            edge.add_arc(ArcId(a));
        }
        edge
    }

    #[test]
    fn finds_link_and_chain_exclusions() {
        let (graph, types) = conflict_star();
        let term = CandidateConflictTerm::new(&graph, &types).unwrap();

        let expected = vec![
            ExclusivePair::new(edge(&[0, 5]), edge(&[1, 6])),
            ExclusivePair::new(edge(&[0, 5]), edge(&[2, 7])),
            ExclusivePair::new(edge(&[8]), edge(&[4])),
            ExclusivePair::new(edge(&[9]), edge(&[3])),
        ];
        assert_eq!(term.pairs(), expected.as_slice());
    }

    #[test]
    fn detects_violations_and_inadmissible_swaps() {
        let (graph, types) = conflict_star();
        let term = CandidateConflictTerm::new(&graph, &types).unwrap();

        // 0->2, 2->1 (conflict), 1->3 (conflict): a chain of two conflict arcs
        let mut selection = ArcSelection::new(&graph);
        for a in [1, 8, 4] {
            selection[ArcId(a)] = true;
        }
        let mut found = Vec::new();
        term.violations(&selection, &mut found);
        assert_eq!(found, vec![&ExclusivePair::new(edge(&[4]), edge(&[8]))]);
        assert!(!term.is_feasible(&selection));

        // 0->2, 0->3, 3->1: candidate 1 hung off 3, no violation
        let mut selection = ArcSelection::new(&graph);
        for a in [1, 2, 9] {
            selection[ArcId(a)] = true;
        }
        assert!(term.is_feasible(&selection));

        // Linking 1 directly to the root would clash with the link to 2
        assert!(!term.admits(&Proposal::new(&selection, Some(ArcId(9)), ArcId(0))));
        // Swapping 0->3 for 1->3 keeps the selection conflict-free on links
        assert!(term.admits(&Proposal::new(&selection, Some(ArcId(2)), ArcId(7))));
    }

    #[test]
    fn conflicts_parallel_to_links_are_rejected() {
        let mut graph = Graph::new();
        let mut types = ArcTypes::new(&graph);
        let u = graph.add_node();
        let v = graph.add_node();
        graph.add_arc(u, v).unwrap();
        let conflict = graph.add_arc(u, v).unwrap();
        types[conflict] = ArcType::Conflict;

        let err = CandidateConflictTerm::new(&graph, &types).err().unwrap();
        assert!(matches!(err, HostError::ParallelLinks { .. }));
    }

    #[test]
    fn graphs_without_conflicts_have_no_pairs() {
        let mut graph = Graph::new();
        let types = ArcTypes::new(&graph);
        let u = graph.add_node();
        let v = graph.add_node();
        graph.add_arc(u, v).unwrap();
        let term = CandidateConflictTerm::new(&graph, &types).unwrap();
        assert!(term.pairs().is_empty());
    }
}
