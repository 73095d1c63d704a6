//! Human and machine readable output of graphs and search results.
pub mod report;

pub use report::{format_selection, format_tree, format_weights, SearchReport};
