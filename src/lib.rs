//! Higher-order spanning tree (HOST) search.
//!
//! Finds a minimum cost arborescence of a weighted candidate graph under
//! mutual exclusion constraints between candidates and higher-order costs on
//! combinations of edges. Graphs come from files ([`io`]) or are generated
//! ([`graph::RandomWeightedGraphGenerator`]); costs and constraints are
//! attached as [`terms::Term`]s to a [`solver::HostSearch`].

pub mod analysis;
pub mod display;
pub mod error;
pub mod graph;
pub mod io;
pub mod solver;
pub mod terms;

pub use error::{HostError, Result};
pub use graph::{ArcId, ArcLabels, ArcSelection, ArcType, ArcTypes, ArcWeights, Edge, Graph, NodeId};
pub use solver::{HostSearch, SearchConfig, SearchOutcome, SearchPhase};
