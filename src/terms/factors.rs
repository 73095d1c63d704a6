//! Higher-order cost contributions over jointly selected edges or arcs.

use super::Proposal;
use crate::graph::{ArcId, ArcSelection, ArcWeights, Edge, Graph};
use std::collections::BTreeMap;

/// A member of a factor combination: something made of one or more arcs that
/// counts as selected when any of its arcs is.
pub trait FactorKey: Clone + Ord + std::fmt::Debug {
    fn arcs(&self) -> &[ArcId];

    /// The key containing `arc` in `graph`.
    fn from_arc(graph: &Graph, arc: ArcId) -> Self;
}

impl FactorKey for Edge {
    fn arcs(&self) -> &[ArcId] { Edge::arcs(self) }

    fn from_arc(graph: &Graph, arc: ArcId) -> Self { graph.edge_from_arc(arc) }
}

impl FactorKey for ArcId {
    fn arcs(&self) -> &[ArcId] { std::slice::from_ref(self) }

    fn from_arc(_graph: &Graph, arc: ArcId) -> Self { arc }
}

/// Maps unordered combinations of keys to the cost charged when all of them are
/// selected together.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiFactors<K: FactorKey> {
    factors: BTreeMap<Vec<K>, f64>,
}

pub type MultiEdgeFactors = MultiFactors<Edge>;
pub type MultiArcFactors = MultiFactors<ArcId>;

impl<K: FactorKey> Default for MultiFactors<K> {
    fn default() -> Self { Self { factors: BTreeMap::new() } }
}

impl<K: FactorKey> MultiFactors<K> {
    pub fn new() -> Self { Self::default() }

    /// Sets the value of a combination, returning the previous one.
    /// Order and repetitions of `keys` are irrelevant. An empty combination
    /// is never stored.
    pub fn insert(&mut self, keys: Vec<K>, value: f64) -> Option<f64> {
        let keys = normalize(keys);
        if keys.is_empty() {
            return None;
        }
        self.factors.insert(keys, value)
    }

    pub fn get(&self, keys: Vec<K>) -> Option<f64> { self.factors.get(&normalize(keys)).copied() }

    pub fn len(&self) -> usize { self.factors.len() }
    pub fn is_empty(&self) -> bool { self.factors.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&[K], f64)> + '_ {
        self.factors.iter().map(|(keys, &value)| (keys.as_slice(), value))
    }
}

fn normalize<K: Ord>(mut keys: Vec<K>) -> Vec<K> {
    keys.sort();
    keys.dedup();
    keys
}

/// Charges a factor's value whenever every key of its combination is selected.
pub struct MultiFactorTerm<'a, K: FactorKey> {
    factors: Vec<(&'a [K], f64)>,
    // Factor indices per arc
    by_arc: Vec<Vec<u32>>,
}

impl<'a, K: FactorKey> MultiFactorTerm<'a, K> {
    pub fn new(graph: &'a Graph, factors: &'a MultiFactors<K>) -> Self {
        let factors: Vec<_> = factors.iter().collect();

        let mut by_arc = vec![Vec::new(); graph.arc_count()];
        for (i, (keys, _)) in factors.iter().enumerate() {
            for arc in keys.iter().flat_map(|key| key.arcs().iter()) {
                if arc.index() >= by_arc.len() {
                    by_arc.resize(arc.index() + 1, Vec::new());
                }
                let slot: &mut Vec<u32> = &mut by_arc[arc.index()];
                if slot.last() != Some(&(i as u32)) {
                    slot.push(i as u32);
                }
            }
        }

        Self { factors, by_arc }
    }

    /// Spreads each factor's value evenly over the arcs of its keys.
    pub fn add_arc_weights(&self, weights: &mut ArcWeights) {
        for &(keys, value) in &self.factors {
            let share = value / keys.len() as f64;
            for key in keys {
                for &arc in key.arcs() {
                    weights[arc] += share;
                }
            }
        }
    }

    pub fn cost(&self, selection: &ArcSelection) -> f64 {
        self.factors
            .iter()
            .filter(|(keys, _)| keys.iter().all(|key| key.arcs().iter().any(|&arc| selection[arc])))
            .map(|&(_, value)| value)
            .sum()
    }

    pub fn swap_delta(&self, proposal: &Proposal<'_>) -> f64 {
        let mut touched: Vec<u32> = Vec::new();
        for arc in proposal.removed.into_iter().chain(std::iter::once(proposal.added)) {
            if let Some(indices) = self.by_arc.get(arc.index()) {
                touched.extend_from_slice(indices);
            }
        }
        touched.sort_unstable();
        touched.dedup();

        let mut delta = 0.0;
        for i in touched {
            let (keys, value) = self.factors[i as usize];
            let before = keys.iter().all(|key| key.arcs().iter().any(|&arc| proposal.selection[arc]));
            let after = keys.iter().all(|key| key.arcs().iter().any(|&arc| proposal.is_selected(arc)));
            match (before, after) {
                (false, true) => delta += value,
                (true, false) => delta -= value,
                _ => {}
            }
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;
    use rstest::rstest;

    /// Undirected path 0 - 1 - 2 - 3 plus shortcuts 0 - 2 and 0 - 3.
    fn shortcut_path() -> (Graph, Vec<Edge>) {
        let mut graph = Graph::new();
        graph.set_undirected(true);
        for _ in 0..4 {
            graph.add_node();
        }
        let edges = [(0, 1), (1, 2), (2, 3), (0, 2), (0, 3)]
            .iter()
            .map(|&(u, v)| graph.add_edge(NodeId(u), NodeId(v)).unwrap())
            .collect();
        (graph, edges)
    }

    #[test]
    fn keys_are_unordered_sets() {
        let mut factors = MultiArcFactors::new();
        assert_eq!(factors.insert(vec![ArcId(3), ArcId(1), ArcId(3)], 2.0), None);
        assert_eq!(factors.insert(vec![ArcId(1), ArcId(3)], 5.0), Some(2.0));
        assert_eq!(factors.len(), 1);
        assert_eq!(factors.get(vec![ArcId(3), ArcId(1)]), Some(5.0));
    }

    #[test]
    fn empty_combinations_are_ignored() {
        let mut factors = MultiArcFactors::new();
        assert_eq!(factors.insert(Vec::new(), 4.0), None);
        assert!(factors.is_empty());
        assert_eq!(factors.get(Vec::new()), None);
    }

    #[test]
    fn factors_on_arcs_outside_the_graph_are_inert() {
        let (graph, edges) = shortcut_path();
        let mut factors = MultiArcFactors::new();
        factors.insert(vec![edges[0][0], ArcId(99)], 3.0);
        let term = MultiFactorTerm::new(&graph, &factors);

        let mut selection = ArcSelection::new(&graph);
        selection[edges[0][0]] = true;
        assert_eq!(term.cost(&selection), 0.0);
        let proposal = Proposal::new(&selection, Some(edges[0][0]), edges[3][0]);
        assert_eq!(term.swap_delta(&proposal), 0.0);
    }

    #[test]
    fn edge_keys_cover_both_directions() {
        let (graph, edges) = shortcut_path();
        let mut factors = MultiEdgeFactors::new();
        factors.insert(vec![edges[0].clone(), edges[1].clone(), edges[2].clone()], -6.0);
        factors.insert(vec![edges[3].clone(), edges[4].clone()], 2.0);
        let term = MultiFactorTerm::new(&graph, &factors);

        // 0->1, 2->1 (the opposite of edge 1), 2->3
        let mut selection = ArcSelection::new(&graph);
        for arc in [edges[0][0], edges[1][1], edges[2][0]] {
            selection[arc] = true;
        }
        assert_eq!(term.cost(&selection), -6.0);

        let mut priors = ArcWeights::new(&graph);
        term.add_arc_weights(&mut priors);
        assert_eq!(priors[edges[1][1]], -2.0);
        assert_eq!(priors[edges[4][0]], 1.0);
    }

    #[rstest]
    // Dropping 1-2 for 0->2 breaks the -6 combination
    #[case(1, 3, 6.0)]
    // Dropping 2->3 for 0->3 breaks it as well
    #[case(2, 4, 6.0)]
    fn swap_delta_tracks_factor_activation(#[case] removed: usize, #[case] added: usize, #[case] expected: f64) {
        let (graph, edges) = shortcut_path();
        let mut factors = MultiEdgeFactors::new();
        factors.insert(vec![edges[0].clone(), edges[1].clone(), edges[2].clone()], -6.0);
        factors.insert(vec![edges[3].clone(), edges[4].clone()], 2.0);
        let term = MultiFactorTerm::new(&graph, &factors);

        let mut selection = ArcSelection::new(&graph);
        for edge in &edges[..3] {
            selection[edge[0]] = true;
        }
        let proposal = Proposal::new(&selection, Some(edges[removed][0]), edges[added][0]);
        assert_eq!(term.swap_delta(&proposal), expected);
    }

    #[test]
    fn completing_a_combination_charges_it() {
        let (graph, edges) = shortcut_path();
        let mut factors = MultiArcFactors::new();
        factors.insert(vec![edges[3][0], edges[4][0]], 2.0);
        let term = MultiFactorTerm::new(&graph, &factors);

        let mut selection = ArcSelection::new(&graph);
        selection[edges[0][0]] = true;
        selection[edges[3][0]] = true;
        let proposal = Proposal::new(&selection, Some(edges[0][0]), edges[4][0]);
        assert_eq!(term.swap_delta(&proposal), 2.0);

        let mut after = selection.clone();
        after[edges[0][0]] = false;
        after[edges[4][0]] = true;
        assert_eq!(term.cost(&after) - term.cost(&selection), 2.0);
    }
}
