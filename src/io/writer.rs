use super::lgf::write_row;
use crate::error::{HostError, Result};
use crate::graph::{ArcLabels, ArcSelection, ArcType, ArcTypes, ArcWeights, Graph};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Output flavour, chosen by file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    /// Lemon graph format, readable by [`super::WeightedGraphReader`].
    Lgf,
    /// GUESS node and arc definitions.
    Guess,
}

impl GraphFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("lgf") => GraphFormat::Lgf,
            _ => GraphFormat::Guess,
        }
    }
}

/// Writes a weighted graph together with an arc selection.
///
/// Labels and types are optional; without them arcs are labelled by id and
/// written as links.
pub struct WeightedGraphWriter<'m> {
    path: PathBuf,
    labels: Option<&'m ArcLabels>,
    types: Option<&'m ArcTypes>,
}

impl<'m> WeightedGraphWriter<'m> {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), labels: None, types: None }
    }

    pub fn with_labels(mut self, labels: &'m ArcLabels) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_types(mut self, types: &'m ArcTypes) -> Self {
        self.types = Some(types);
        self
    }

    pub fn write(&self, graph: &Graph, weights: &ArcWeights, selection: &ArcSelection) -> Result<()> {
        let text = self.render(GraphFormat::from_path(&self.path), graph, weights, selection);
        std::fs::write(&self.path, text)
            .map_err(|source| HostError::Io { path: self.path.display().to_string(), source })
    }

    pub fn render(&self, format: GraphFormat, graph: &Graph, weights: &ArcWeights, selection: &ArcSelection) -> String {
        match format {
            GraphFormat::Lgf => self.render_lgf(graph, weights, selection),
            GraphFormat::Guess => render_guess(graph, weights, selection),
        }
    }

    fn render_lgf(&self, graph: &Graph, weights: &ArcWeights, selection: &ArcSelection) -> String {
        let mut out = String::new();

        out.push_str("@nodes\nlabel\n");
        for node in graph.nodes() {
            let _ = writeln!(out, "{}", node.0);
        }

        out.push_str("@arcs\n\t\tlabel\tweight\ttype\tmst\n");
        for arc in graph.arcs() {
            let label = match self.labels {
                Some(labels) => labels[arc].clone(),
                None => arc.0.to_string(),
            };
            let kind = self.types.map_or(ArcType::Link, |types| types[arc]);
            let fields = [
                graph.source(arc).0.to_string(),
                graph.target(arc).0.to_string(),
                label,
                weights[arc].to_string(),
                kind.code().to_string(),
                u8::from(selection[arc]).to_string(),
            ];
            write_row(&mut out, fields.iter().map(String::as_str));
        }

        out.push_str("@attributes\n");
        let _ = writeln!(out, "undirected\t{}", u8::from(graph.is_undirected()));
        if graph.node_count() > 0 {
            let _ = writeln!(out, "root\t{}", graph.root().0);
        }
        out
    }
}

fn render_guess(graph: &Graph, weights: &ArcWeights, selection: &ArcSelection) -> String {
    let mut out = String::from("nodedef>name VARCHAR\n");
    for node in graph.nodes() {
        let _ = writeln!(out, "{}", node.0);
    }
    out.push_str("arcdef>node1 VARCHAR,node2 VARCHAR,weight DOUBLE,mst BOOLEAN\n");
    for arc in graph.arcs() {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            graph.source(arc).0,
            graph.target(arc).0,
            weights[arc],
            selection[arc]
        );
    }
    out
}
