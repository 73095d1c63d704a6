//! Defines the core data structures for the weighted candidate graph.
pub mod edge;
pub mod generator;
pub mod maps;
pub mod storage;

// Re-export key types for convenient access
pub use edge::Edge;
pub use generator::RandomWeightedGraphGenerator;
pub use maps::{ArcLabels, ArcMap, ArcSelection, ArcType, ArcTypes, ArcWeights};
pub use storage::{ArcId, ArcIt, Graph, InArcIt, NodeId, NodeIt, OutArcIt};
