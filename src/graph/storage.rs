//! storage.rs
//! Dense arena layout for a directed multigraph.
//!
//! Nodes and arcs are sequential integer ids into parallel columns. Adjacency is
//! kept as intrusive linked lists (one outgoing, one incoming) that are appended
//! at the tail, so every iteration follows insertion order. `INVALID` ends a list.

use super::edge::Edge;
use crate::error::{HostError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub(crate) const INVALID: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ArcId(pub u32);

impl ArcId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

impl fmt::Display for ArcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    // Arc columns
    sources: Vec<NodeId>,
    targets: Vec<NodeId>,
    next_out: Vec<u32>,
    next_in: Vec<u32>,

    // Node columns (list heads and tails)
    first_out: Vec<u32>,
    last_out: Vec<u32>,
    first_in: Vec<u32>,
    last_in: Vec<u32>,

    undirected: bool,
    root: NodeId,
}

impl Graph {
    pub fn new() -> Self { Self::default() }

    pub fn node_count(&self) -> usize { self.first_out.len() }
    pub fn arc_count(&self) -> usize { self.sources.len() }

    pub fn contains_node(&self, node: NodeId) -> bool { node.index() < self.node_count() }
    pub fn contains_arc(&self, arc: ArcId) -> bool { arc.index() < self.arc_count() }

    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId::new(self.first_out.len());
        self.first_out.push(INVALID);
        self.last_out.push(INVALID);
        self.first_in.push(INVALID);
        self.last_in.push(INVALID);
        id
    }

    pub fn add_arc(&mut self, source: NodeId, target: NodeId) -> Result<ArcId> {
        if !self.contains_node(source) {
            return Err(HostError::UnknownNode(source));
        }
        if !self.contains_node(target) {
            return Err(HostError::UnknownNode(target));
        }

        let id = self.sources.len() as u32;
        self.sources.push(source);
        self.targets.push(target);
        self.next_out.push(INVALID);
        self.next_in.push(INVALID);

        // Tail append keeps adjacency in insertion order
        let s = source.index();
        match self.last_out[s] {
            INVALID => self.first_out[s] = id,
            tail => self.next_out[tail as usize] = id,
        }
        self.last_out[s] = id;

        let t = target.index();
        match self.last_in[t] {
            INVALID => self.first_in[t] = id,
            tail => self.next_in[tail as usize] = id,
        }
        self.last_in[t] = id;

        Ok(ArcId(id))
    }

    /// Adds the arc `u -> v` and, for undirected graphs, its opposite `v -> u`.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId) -> Result<Edge> {
        let mut edge = Edge::from_arc(self.add_arc(u, v)?);
        if self.undirected {
            edge.add_arc(self.add_arc(v, u)?);
        }
        Ok(edge)
    }

    #[inline(always)]
    pub fn source(&self, arc: ArcId) -> NodeId { self.sources[arc.index()] }

    #[inline(always)]
    pub fn target(&self, arc: ArcId) -> NodeId { self.targets[arc.index()] }

    /// Undirected graphs have symmetric link arcs. The flag is declarative and
    /// does not check the arcs.
    pub fn is_undirected(&self) -> bool { self.undirected }
    pub fn set_undirected(&mut self, undirected: bool) { self.undirected = undirected; }

    pub fn root(&self) -> NodeId { self.root }

    pub fn set_root(&mut self, root: NodeId) -> Result<()> {
        if !self.contains_node(root) {
            return Err(HostError::UnknownNode(root));
        }
        self.root = root;
        Ok(())
    }

    /// The first arc from `source` to `target`, if any.
    pub fn find_arc(&self, source: NodeId, target: NodeId) -> Option<ArcId> {
        self.out_arcs(source).find(|&arc| self.target(arc) == target)
    }

    /// The arc running opposite to `arc`, if the graph has one.
    pub fn reverse_arc(&self, arc: ArcId) -> Option<ArcId> {
        self.find_arc(self.target(arc), self.source(arc))
    }

    /// The edge containing `arc`: the arc itself plus its reverse, if present.
    pub fn edge_from_arc(&self, arc: ArcId) -> Edge {
        let mut edge = Edge::from_arc(arc);
        if let Some(reverse) = self.reverse_arc(arc) {
            edge.add_arc(reverse);
        }
        edge
    }

    pub fn out_degree(&self, node: NodeId) -> usize { self.out_arcs(node).count() }
    pub fn in_degree(&self, node: NodeId) -> usize { self.in_arcs(node).count() }

    // --- Iteration ---

    pub fn nodes(&self) -> NodeIt { NodeIt { next: 0, end: self.node_count() as u32 } }

    pub fn arcs(&self) -> ArcIt { ArcIt { next: 0, end: self.arc_count() as u32 } }

    pub fn out_arcs(&self, node: NodeId) -> OutArcIt<'_> {
        OutArcIt { graph: self, current: self.first_out[node.index()] }
    }

    pub fn in_arcs(&self, node: NodeId) -> InArcIt<'_> {
        InArcIt { graph: self, current: self.first_in[node.index()] }
    }
}

#[derive(Debug, Clone)]
pub struct NodeIt {
    next: u32,
    end: u32,
}

impl Iterator for NodeIt {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.next >= self.end {
            return None;
        }
        self.next += 1;
        Some(NodeId(self.next - 1))
    }
}

#[derive(Debug, Clone)]
pub struct ArcIt {
    next: u32,
    end: u32,
}

impl Iterator for ArcIt {
    type Item = ArcId;

    fn next(&mut self) -> Option<ArcId> {
        if self.next >= self.end {
            return None;
        }
        self.next += 1;
        Some(ArcId(self.next - 1))
    }
}

#[derive(Debug, Clone)]
pub struct OutArcIt<'a> {
    graph: &'a Graph,
    current: u32,
}

impl Iterator for OutArcIt<'_> {
    type Item = ArcId;

    fn next(&mut self) -> Option<ArcId> {
        if self.current == INVALID {
            return None;
        }
        let arc = self.current;
        self.current = self.graph.next_out[arc as usize];
        Some(ArcId(arc))
    }
}

#[derive(Debug, Clone)]
pub struct InArcIt<'a> {
    graph: &'a Graph,
    current: u32,
}

impl Iterator for InArcIt<'_> {
    type Item = ArcId;

    fn next(&mut self) -> Option<ArcId> {
        if self.current == INVALID {
            return None;
        }
        let arc = self.current;
        self.current = self.graph.next_in[arc as usize];
        Some(ArcId(arc))
    }
}
