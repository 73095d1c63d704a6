use super::read_text;
use crate::error::{HostError, Result};
use crate::graph::{ArcId, ArcLabels, Graph};
use crate::terms::{FactorKey, MultiFactors};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads multi-factors, one per line: `<value> <label> <label> ...`.
///
/// Labels name arcs. Whether a label stands for its arc or for the whole edge
/// containing it is decided by the key type of the factors being filled.
pub struct MultiFactorReader {
    path: PathBuf,
}

impl MultiFactorReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn fill<K: FactorKey>(&self, graph: &Graph, labels: &ArcLabels, factors: &mut MultiFactors<K>) -> Result<()> {
        let text = read_text(&self.path)?;
        fill_from_str(&text, &self.path.display().to_string(), graph, labels, factors)
    }
}

pub fn fill_from_str<K: FactorKey>(
    text: &str,
    origin: &str,
    graph: &Graph,
    labels: &ArcLabels,
    factors: &mut MultiFactors<K>,
) -> Result<()> {
    let by_label: HashMap<&str, ArcId> = graph.arcs().map(|arc| (labels[arc].as_str(), arc)).collect();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let mut tokens = line.split_whitespace();
        let Some(value) = tokens.next() else { continue };
        if value.starts_with('#') {
            continue;
        }

        let value: f64 = value.parse().map_err(|e| HostError::Parse {
            path: origin.to_string(),
            line: line_no,
            msg: format!("invalid factor value '{}': {}", value, e),
        })?;

        let keys = tokens
            .map(|label| {
                by_label.get(label).map(|&arc| K::from_arc(graph, arc)).ok_or_else(|| HostError::UnknownLabel {
                    path: origin.to_string(),
                    line: line_no,
                    label: label.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if keys.is_empty() {
            return Err(HostError::Parse { path: origin.to_string(), line: line_no, msg: "factor names no arcs".into() });
        }

        factors.insert(keys, value);
    }

    debug!(origin, factors = factors.len(), "read multi-factors");
    Ok(())
}
