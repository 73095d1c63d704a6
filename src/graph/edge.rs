//! Defines the `Edge` type, the unit of selection in undirected graphs.

use super::storage::ArcId;
use smallvec::SmallVec;
use std::ops::Index;

/// All arcs between two nodes: one for directed graphs, the arc and its
/// opposite for undirected ones.
///
/// Arcs are kept sorted by id, so two edges are equal iff they hold the same
/// arcs regardless of which arc they were built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    arcs: SmallVec<[ArcId; 2]>,
}

impl Edge {
    pub fn from_arc(arc: ArcId) -> Self {
        let mut arcs = SmallVec::new();
        arcs.push(arc);
        Self { arcs }
    }

    pub fn add_arc(&mut self, arc: ArcId) {
        if let Err(pos) = self.arcs.binary_search(&arc) {
            self.arcs.insert(pos, arc);
        }
    }

    pub fn len(&self) -> usize { self.arcs.len() }
    pub fn is_empty(&self) -> bool { self.arcs.is_empty() }

    pub fn contains(&self, arc: ArcId) -> bool { self.arcs.binary_search(&arc).is_ok() }

    pub fn arcs(&self) -> &[ArcId] { &self.arcs }

    pub fn iter(&self) -> impl Iterator<Item = ArcId> + '_ { self.arcs.iter().copied() }
}

impl Index<usize> for Edge {
    type Output = ArcId;

    fn index(&self, i: usize) -> &ArcId { &self.arcs[i] }
}

impl<'a> IntoIterator for &'a Edge {
    type Item = ArcId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, ArcId>>;

    fn into_iter(self) -> Self::IntoIter { self.arcs.iter().copied() }
}
