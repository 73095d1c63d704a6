use super::Proposal;
use crate::graph::{ArcSelection, ArcWeights, Graph};

/// An arc term contributing an explicit set of arc weights.
pub struct ExplicitWeightTerm<'a> {
    graph: &'a Graph,
    weights: &'a ArcWeights,
}

impl<'a> ExplicitWeightTerm<'a> {
    pub fn new(graph: &'a Graph, weights: &'a ArcWeights) -> Self {
        Self { graph, weights }
    }

    pub fn add_arc_weights(&self, weights: &mut ArcWeights) {
        for arc in self.graph.arcs() {
            weights[arc] += self.weights[arc];
        }
    }

    pub fn cost(&self, selection: &ArcSelection) -> f64 {
        self.graph.arcs().filter(|&arc| selection[arc]).map(|arc| self.weights[arc]).sum()
    }

    pub fn swap_delta(&self, proposal: &Proposal<'_>) -> f64 {
        let removed = proposal.removed.map_or(0.0, |arc| self.weights[arc]);
        self.weights[proposal.added] - removed
    }
}
