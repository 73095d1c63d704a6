//! Crate-wide error type.
use crate::graph::{ArcId, NodeId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("node {0} does not belong to this graph")]
    UnknownNode(NodeId),
    #[error("arc {0} does not belong to this graph")]
    UnknownArc(ArcId),
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {msg}")]
    Parse { path: String, line: usize, msg: String },
    #[error("{path}:{line}: unknown arc label '{label}'")]
    UnknownLabel { path: String, line: usize, label: String },
    #[error("arc {arc} already has a reverse arc {reverse} that is not its '_opp' counterpart")]
    AmbiguousReverse { arc: ArcId, reverse: ArcId },
    #[error("conflict between nodes {from} and {to} has parallel link arcs")]
    ParallelLinks { from: NodeId, to: NodeId },
    #[error("cannot place {requested} arcs between {nodes} nodes without parallel arcs")]
    TooManyArcs { requested: usize, nodes: usize },
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HostError>;
