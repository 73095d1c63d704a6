//! Structural checks over graphs and arc selections.
pub mod topology;

pub use topology::{reachable_from, validate_arborescence, TreeDefect};
