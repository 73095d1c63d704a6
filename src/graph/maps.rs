//! Arc attribute maps: weights, labels, types and selections.

use super::edge::Edge;
use super::storage::{ArcId, Graph};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Describes the role of an arc in the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArcType {
    /// An ordinary spanning tree candidate.
    #[default]
    Link,
    /// Marks its two endpoint candidates as mutually exclusive.
    Conflict,
}

impl ArcType {
    /// Numeric code used by the graph text format.
    pub fn code(self) -> u8 {
        match self {
            ArcType::Link => 0,
            ArcType::Conflict => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ArcType::Link),
            1 => Some(ArcType::Conflict),
            _ => None,
        }
    }
}

/// Dense map from arcs to values.
///
/// Reads of arcs that were never written yield the fallback value; writes grow
/// the map as needed, so a map may be created before its graph is populated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArcMap<T> {
    values: Vec<T>,
    fallback: T,
}

impl<T: Clone + Default> ArcMap<T> {
    pub fn new(graph: &Graph) -> Self {
        Self::with_value(graph, T::default())
    }

    pub fn with_value(graph: &Graph, value: T) -> Self {
        Self { values: vec![value; graph.arc_count()], fallback: T::default() }
    }

    /// Resizes to the graph's arc count and sets every value to `value`.
    pub fn reset(&mut self, graph: &Graph, value: T) {
        self.values.clear();
        self.values.resize(graph.arc_count(), value);
    }

    pub fn get(&self, arc: ArcId) -> Option<&T> { self.values.get(arc.index()) }

    pub fn set(&mut self, arc: ArcId, value: T) { self[arc] = value; }

    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (ArcId, &T)> + '_ {
        self.values.iter().enumerate().map(|(i, v)| (ArcId::new(i), v))
    }
}

impl<T> Index<ArcId> for ArcMap<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, arc: ArcId) -> &T { self.values.get(arc.index()).unwrap_or(&self.fallback) }
}

impl<T: Clone> IndexMut<ArcId> for ArcMap<T> {
    fn index_mut(&mut self, arc: ArcId) -> &mut T {
        let idx = arc.index();
        if idx >= self.values.len() {
            self.values.resize(idx + 1, self.fallback.clone());
        }
        &mut self.values[idx]
    }
}

pub type ArcWeights = ArcMap<f64>;
pub type ArcLabels = ArcMap<String>;
pub type ArcTypes = ArcMap<ArcType>;

/// Selection of arcs, represented as bool attributes.
pub type ArcSelection = ArcMap<bool>;

impl ArcMap<f64> {
    /// Adds `value` to every arc of `edge`.
    pub fn add_to_edge(&mut self, edge: &Edge, value: f64) {
        for arc in edge.iter() {
            self[arc] += value;
        }
    }
}

impl ArcMap<bool> {
    /// True if any arc of `edge` is selected.
    pub fn contains_edge(&self, edge: &Edge) -> bool { edge.iter().any(|arc| self[arc]) }

    pub fn selected(&self) -> impl Iterator<Item = ArcId> + '_ {
        self.iter().filter(|(_, &on)| on).map(|(arc, _)| arc)
    }

    pub fn count_selected(&self) -> usize { self.values.iter().filter(|&&on| on).count() }
}
