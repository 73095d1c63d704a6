//! Objective and constraint terms consumed by the HOST search.
//!
//! The set of terms is closed, so it is a sum type rather than a trait object.
//! Each term answers three questions about a selection:
//!
//! 1. **Prior**: how it wants arcs ordered before anything is selected
//!    (`add_arc_weights`).
//! 2. **Evaluation**: its exact cost and any hard-constraint violations of a
//!    full selection (`cost`, `violations`).
//! 3. **Proposal**: the exact cost change and admissibility of replacing one
//!    selected arc by another (`swap_delta`, `admits`).
//!
//! Terms are read-only over the graph and its attribute maps.

pub mod conflict;
pub mod factors;
pub mod weight;

pub use conflict::{CandidateConflictTerm, ExclusivePair};
pub use factors::{FactorKey, MultiArcFactors, MultiEdgeFactors, MultiFactorTerm, MultiFactors};
pub use weight::ExplicitWeightTerm;

use crate::graph::{ArcId, ArcSelection, ArcWeights, Edge};

/// A selection with one arc swapped: `removed` (if any) leaves, `added` joins.
#[derive(Debug, Clone, Copy)]
pub struct Proposal<'s> {
    pub selection: &'s ArcSelection,
    pub removed: Option<ArcId>,
    pub added: ArcId,
}

impl<'s> Proposal<'s> {
    pub fn new(selection: &'s ArcSelection, removed: Option<ArcId>, added: ArcId) -> Self {
        Self { selection, removed, added }
    }

    /// Selection state of `arc` after the swap.
    #[inline]
    pub fn is_selected(&self, arc: ArcId) -> bool {
        arc == self.added || (self.selection[arc] && Some(arc) != self.removed)
    }

    pub fn contains_edge(&self, edge: &Edge) -> bool { edge.iter().any(|arc| self.is_selected(arc)) }
}

/// The `(cost, feasible)` pair of a term on a selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub cost: f64,
    pub feasible: bool,
}

pub enum Term<'a> {
    ExplicitWeight(ExplicitWeightTerm<'a>),
    CandidateConflict(CandidateConflictTerm),
    MultiEdgeFactor(MultiFactorTerm<'a, Edge>),
    MultiArcFactor(MultiFactorTerm<'a, ArcId>),
}

impl<'a> Term<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            Term::ExplicitWeight(_) => "explicit-weight",
            Term::CandidateConflict(_) => "candidate-conflict",
            Term::MultiEdgeFactor(_) => "multi-edge-factor",
            Term::MultiArcFactor(_) => "multi-arc-factor",
        }
    }

    pub fn add_arc_weights(&self, weights: &mut ArcWeights) {
        match self {
            Term::ExplicitWeight(t) => t.add_arc_weights(weights),
            Term::CandidateConflict(_) => {}
            Term::MultiEdgeFactor(t) => t.add_arc_weights(weights),
            Term::MultiArcFactor(t) => t.add_arc_weights(weights),
        }
    }

    pub fn cost(&self, selection: &ArcSelection) -> f64 {
        match self {
            Term::ExplicitWeight(t) => t.cost(selection),
            Term::CandidateConflict(_) => 0.0,
            Term::MultiEdgeFactor(t) => t.cost(selection),
            Term::MultiArcFactor(t) => t.cost(selection),
        }
    }

    /// Appends the exclusive pairs violated by `selection`.
    pub fn violations<'t>(&'t self, selection: &ArcSelection, out: &mut Vec<&'t ExclusivePair>) {
        if let Term::CandidateConflict(t) = self {
            t.violations(selection, out);
        }
    }

    pub fn evaluate(&self, selection: &ArcSelection) -> Evaluation {
        let feasible = match self {
            Term::CandidateConflict(t) => t.is_feasible(selection),
            _ => true,
        };
        Evaluation { cost: self.cost(selection), feasible }
    }

    pub fn swap_delta(&self, proposal: &Proposal<'_>) -> f64 {
        match self {
            Term::ExplicitWeight(t) => t.swap_delta(proposal),
            Term::CandidateConflict(_) => 0.0,
            Term::MultiEdgeFactor(t) => t.swap_delta(proposal),
            Term::MultiArcFactor(t) => t.swap_delta(proposal),
        }
    }

    /// False if the proposal introduces a hard-constraint violation.
    pub fn admits(&self, proposal: &Proposal<'_>) -> bool {
        match self {
            Term::CandidateConflict(t) => t.admits(proposal),
            _ => true,
        }
    }
}

impl<'a> From<ExplicitWeightTerm<'a>> for Term<'a> {
    fn from(term: ExplicitWeightTerm<'a>) -> Self { Term::ExplicitWeight(term) }
}

impl From<CandidateConflictTerm> for Term<'_> {
    fn from(term: CandidateConflictTerm) -> Self { Term::CandidateConflict(term) }
}

impl<'a> From<MultiFactorTerm<'a, Edge>> for Term<'a> {
    fn from(term: MultiFactorTerm<'a, Edge>) -> Self { Term::MultiEdgeFactor(term) }
}

impl<'a> From<MultiFactorTerm<'a, ArcId>> for Term<'a> {
    fn from(term: MultiFactorTerm<'a, ArcId>) -> Self { Term::MultiArcFactor(term) }
}
