use super::lgf::{Document, Row};
use super::read_text;
use crate::error::{HostError, Result};
use crate::graph::{ArcId, ArcLabels, ArcType, ArcTypes, ArcWeights, Graph, NodeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads a weighted graph in lemon graph format.
///
/// Arc columns `label`, `weight` and `type` are required, others are ignored.
/// The attributes `undirected` (default `1`) and `root` (a node label, default
/// the first node) are optional.
///
/// Undirected graphs receive an opposite arc labelled `<label>_opp` for every
/// link arc, and every graph receives one for every conflict arc. Opposites
/// already present in the file are kept as they are.
pub struct WeightedGraphReader {
    path: PathBuf,
}

impl WeightedGraphReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn fill(
        &self,
        graph: &mut Graph,
        weights: &mut ArcWeights,
        labels: &mut ArcLabels,
        types: &mut ArcTypes,
    ) -> Result<()> {
        let text = read_text(&self.path)?;
        fill_from_str(&text, &self.path.display().to_string(), graph, weights, labels, types)
    }
}

/// Like [`WeightedGraphReader::fill`], over text already in memory. `origin`
/// names the text in error messages.
pub fn fill_from_str(
    text: &str,
    origin: &str,
    graph: &mut Graph,
    weights: &mut ArcWeights,
    labels: &mut ArcLabels,
    types: &mut ArcTypes,
) -> Result<()> {
    let doc = Document::parse(text, origin)?;
    let parse_error = |line: usize, msg: String| HostError::Parse { path: origin.to_string(), line, msg };

    // Nodes
    let mut nodes: HashMap<&str, NodeId> = HashMap::new();
    if !doc.nodes.is_empty() {
        let label_column = doc
            .node_columns
            .iter()
            .position(|c| c == "label")
            .ok_or_else(|| parse_error(0, "@nodes section has no 'label' column".into()))?;

        for Row { line, tokens } in &doc.nodes {
            let label = tokens
                .get(label_column)
                .ok_or_else(|| parse_error(*line, "node row has no label".into()))?;
            let node = graph.add_node();
            if nodes.insert(label.as_str(), node).is_some() {
                return Err(parse_error(*line, format!("duplicate node label '{}'", label)));
            }
        }
    }

    // Arcs
    let mut file_arcs = Vec::with_capacity(doc.arcs.len());
    if !doc.arcs.is_empty() {
        let column = |name: &str| -> Result<usize> {
            doc.arc_columns
                .iter()
                .position(|c| c == name)
                .map(|i| i + 2)
                .ok_or_else(|| parse_error(0, format!("@arcs section has no '{}' column", name)))
        };
        let (label_at, weight_at, type_at) = (column("label")?, column("weight")?, column("type")?);

        for Row { line, tokens } in &doc.arcs {
            let line = *line;
            let field = |i: usize| -> Result<&str> {
                tokens
                    .get(i)
                    .map(String::as_str)
                    .ok_or_else(|| parse_error(line, format!("expected {} columns, found {}", doc.arc_columns.len() + 2, tokens.len())))
            };
            let node = |i: usize| -> Result<NodeId> {
                let label = field(i)?;
                nodes.get(label).copied().ok_or_else(|| parse_error(line, format!("unknown node '{}'", label)))
            };

            let (source, target) = (node(0)?, node(1)?);
            let weight: f64 = field(weight_at)?
                .parse()
                .map_err(|e| parse_error(line, format!("invalid weight: {}", e)))?;
            let kind = field(type_at)?
                .parse::<u8>()
                .ok()
                .and_then(ArcType::from_code)
                .ok_or_else(|| parse_error(line, format!("invalid arc type '{}'", tokens[type_at])))?;

            let arc = graph.add_arc(source, target)?;
            weights[arc] = weight;
            labels[arc] = field(label_at)?.to_string();
            types[arc] = kind;
            file_arcs.push(arc);
        }
    }

    // Attributes
    let mut undirected = true;
    let mut root = None;
    for Row { line, tokens } in &doc.attributes {
        let [key, value] = tokens.as_slice() else {
            return Err(parse_error(*line, "attributes take exactly one value".into()));
        };
        match key.as_str() {
            "undirected" => {
                undirected = match value.as_str() {
                    "1" | "true" => true,
                    "0" | "false" => false,
                    other => return Err(parse_error(*line, format!("invalid boolean '{}'", other))),
                }
            }
            "root" => {
                let node = nodes
                    .get(value.as_str())
                    .copied()
                    .ok_or_else(|| parse_error(*line, format!("unknown root node '{}'", value)))?;
                root = Some(node);
            }
            _ => {}
        }
    }

    graph.set_undirected(undirected);
    match root {
        Some(node) => graph.set_root(node)?,
        None if graph.node_count() > 0 => graph.set_root(NodeId(0))?,
        None => {}
    }

    if undirected {
        for &arc in &file_arcs {
            if types[arc] == ArcType::Link {
                add_opposite_arc(graph, arc, weights, labels, types)?;
            }
        }
    }
    for &arc in &file_arcs {
        if types[arc] == ArcType::Conflict {
            add_opposite_arc(graph, arc, weights, labels, types)?;
        }
    }

    debug!(
        origin,
        nodes = graph.node_count(),
        arcs = graph.arc_count(),
        undirected,
        root = graph.root().0,
        "read graph"
    );
    Ok(())
}

fn add_opposite_arc(
    graph: &mut Graph,
    arc: ArcId,
    weights: &mut ArcWeights,
    labels: &mut ArcLabels,
    types: &mut ArcTypes,
) -> Result<()> {
    if let Some(reverse) = graph.reverse_arc(arc) {
        let paired = labels[reverse] == format!("{}_opp", labels[arc]) || labels[arc] == format!("{}_opp", labels[reverse]);
        if paired && types[reverse] == types[arc] {
            return Ok(());
        }
        return Err(HostError::AmbiguousReverse { arc, reverse });
    }

    let opposite = graph.add_arc(graph.target(arc), graph.source(arc))?;
    weights[opposite] = weights[arc];
    labels[opposite] = format!("{}_opp", labels[arc]);
    types[opposite] = types[arc];
    Ok(())
}
