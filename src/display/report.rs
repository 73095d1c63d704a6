use crate::graph::{ArcId, ArcLabels, ArcSelection, ArcWeights, Graph, NodeId};
use crate::solver::{SearchOutcome, SearchPhase};
use serde::Serialize;
use std::fmt::Write;

/// One `source - target: value` line per arc.
pub fn format_arcs<T: std::fmt::Display>(graph: &Graph, value: impl Fn(ArcId) -> T) -> String {
    let mut out = String::new();
    for arc in graph.arcs() {
        let _ = writeln!(out, "{} - {}: {}", graph.source(arc), graph.target(arc), value(arc));
    }
    out
}

pub fn format_weights(graph: &Graph, weights: &ArcWeights) -> String { format_arcs(graph, |arc| weights[arc]) }

pub fn format_selection(graph: &Graph, selection: &ArcSelection) -> String {
    format_arcs(graph, |arc| u8::from(selection[arc]))
}

/// Draws the selected arborescence below the root, one node per line.
pub fn format_tree(graph: &Graph, labels: &ArcLabels, selection: &ArcSelection) -> String {
    let mut children = vec![Vec::new(); graph.node_count()];
    for arc in selection.selected() {
        if let Some(list) = children.get_mut(graph.source(arc).index()) {
            list.push(arc);
        }
    }

    let mut out = String::new();
    if graph.node_count() == 0 {
        return out;
    }
    let _ = writeln!(out, "{}", graph.root());

    // (node, stem, parent arc, last sibling)
    type Entry = (NodeId, String, ArcId, bool);
    let mut stack: Vec<Entry> = Vec::new();
    let push_children = |stack: &mut Vec<Entry>, node: NodeId, stem: &str| {
        let arcs = &children[node.index()];
        for (i, &arc) in arcs.iter().enumerate().rev() {
            stack.push((graph.target(arc), stem.to_string(), arc, i + 1 == arcs.len()));
        }
    };
    push_children(&mut stack, graph.root(), "");

    let mut seen = vec![false; graph.node_count()];
    while let Some((node, stem, arc, is_last)) = stack.pop() {
        if std::mem::replace(&mut seen[node.index()], true) {
            continue;
        }
        let connector = if is_last { "`--" } else { "|--" };
        let _ = writeln!(out, "{}{} {} ({})", stem, connector, node, labels[arc]);
        let child_stem = format!("{}{}", stem, if is_last { "   " } else { "|  " });
        push_children(&mut stack, node, &child_stem);
    }
    out
}

/// Machine readable summary of one search run.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub nodes: usize,
    pub arcs: usize,
    pub value: f64,
    pub constraints_fulfilled: bool,
    pub iterations: usize,
    pub phase: SearchPhase,
    /// Labels of the selected arcs, in arc order.
    pub selected: Vec<String>,
}

impl SearchReport {
    pub fn new(graph: &Graph, labels: &ArcLabels, selection: &ArcSelection, outcome: &SearchOutcome) -> Self {
        Self {
            nodes: graph.node_count(),
            arcs: graph.arc_count(),
            value: outcome.value,
            constraints_fulfilled: outcome.constraints_fulfilled,
            iterations: outcome.iterations,
            phase: outcome.phase,
            selected: selection.selected().map(|arc| labels[arc].clone()).collect(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}
