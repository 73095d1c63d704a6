//! Synthetic weighted graphs for exercising the search without file I/O.

use super::maps::{ArcLabels, ArcType, ArcTypes, ArcWeights};
use super::storage::{Graph, NodeId};
use crate::error::{HostError, Result};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use tracing::trace;

const DEFAULT_SEED: u64 = 23;

/// Builds a directed graph with uniformly sampled arc weights.
///
/// Arcs never form self loops, and no two arcs join the same pair of nodes in
/// either direction. The generator is deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct RandomWeightedGraphGenerator {
    num_nodes: usize,
    num_arcs: usize,
    min_weight: f64,
    max_weight: f64,
    seed: u64,
}

impl RandomWeightedGraphGenerator {
    pub fn new(num_nodes: usize, num_arcs: usize, min_weight: f64, max_weight: f64) -> Self {
        Self { num_nodes, num_arcs, min_weight, max_weight, seed: DEFAULT_SEED }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fill(
        &self,
        graph: &mut Graph,
        weights: &mut ArcWeights,
        labels: &mut ArcLabels,
        types: &mut ArcTypes,
    ) -> Result<()> {
        let capacity = self.num_nodes * self.num_nodes.saturating_sub(1) / 2;
        if self.num_arcs > capacity {
            return Err(HostError::TooManyArcs { requested: self.num_arcs, nodes: self.num_nodes });
        }
        if !(self.min_weight <= self.max_weight) {
            return Err(HostError::Config(format!(
                "minimal arc weight {} exceeds maximal arc weight {}",
                self.min_weight, self.max_weight
            )));
        }

        let mut rng = XorShiftRng::seed_from_u64(self.seed);
        let nodes: Vec<NodeId> = (0..self.num_nodes).map(|_| graph.add_node()).collect();

        for _ in 0..self.num_arcs {
            let (u, v) = loop {
                let u = nodes[rng.gen_range(0..nodes.len())];
                let v = nodes[rng.gen_range(0..nodes.len())];
                if u == v || graph.find_arc(u, v).is_some() || graph.find_arc(v, u).is_some() {
                    continue;
                }
                break (u, v);
            };

            trace!(source = u.0, target = v.0, "adding random arc");

            let weight = self.min_weight + rng.gen::<f64>() * (self.max_weight - self.min_weight);
            let arc = graph.add_arc(u, v)?;
            weights[arc] = weight;
            labels[arc] = format!("r{}", arc.index());
            types[arc] = ArcType::Link;
        }

        Ok(())
    }
}
