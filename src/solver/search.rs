use super::arborescence;
use super::config::SearchConfig;
use super::state::TreeState;
use crate::analysis::topology;
use crate::graph::{ArcId, ArcSelection, ArcWeights, Edge, Graph, NodeId};
use crate::terms::{ExclusivePair, Proposal, Term};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use tracing::{debug, debug_span, info, trace};

/// Where the search is in its `Growing -> Checking -> Repairing | Refining`
/// cycle. `Converged` and `BudgetExhausted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchPhase {
    Idle,
    Growing,
    Checking,
    Repairing,
    Refining,
    Converged,
    BudgetExhausted,
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(self, f) }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchOutcome {
    /// Total cost of the returned selection over all terms.
    pub value: f64,
    /// True if the returned selection violates no hard constraint.
    pub constraints_fulfilled: bool,
    /// Repair and refinement steps taken.
    pub iterations: usize,
    /// The terminal phase.
    pub phase: SearchPhase,
}

/// Finds a low-cost arborescence rooted at the graph's root that honours the
/// hard constraints of the attached terms.
pub struct HostSearch<'a> {
    graph: &'a Graph,
    terms: Vec<Term<'a>>,
    config: SearchConfig,
}

impl<'a> HostSearch<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph, terms: Vec::new(), config: SearchConfig::default() }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add_term(&mut self, term: impl Into<Term<'a>>) {
        self.terms.push(term.into());
    }

    pub fn config(&self) -> &SearchConfig { &self.config }

    pub fn terms(&self) -> &[Term<'a>] { &self.terms }

    /// Writes the best selection found into `selection`.
    pub fn find(&self, selection: &mut ArcSelection) -> SearchOutcome {
        let graph = self.graph;
        let _span = debug_span!("host_search", nodes = graph.node_count(), arcs = graph.arc_count()).entered();

        if graph.node_count() == 0 {
            selection.reset(graph, false);
            return SearchOutcome { value: 0.0, constraints_fulfilled: true, iterations: 0, phase: SearchPhase::Converged };
        }

        let mut priors = ArcWeights::new(graph);
        for term in &self.terms {
            term.add_arc_weights(&mut priors);
        }
        for arc in graph.arcs() {
            trace!(arc = arc.0, prior = priors[arc], "prior weight");
        }

        let reachable = topology::reachable_from(graph, graph.root());
        let unreachable = reachable.iter().filter(|&&r| !r).count();
        if unreachable > 0 {
            debug!(unreachable, "nodes not reachable from the root stay unselected");
        }

        let mut run = Run { search: self, priors, state: TreeState::new(graph), pending: Vec::new() };

        let mut phase = SearchPhase::Growing;
        run.span_minimum();

        let mut best: Option<Best> = None;
        let mut iterations = 0;
        let mut violations = Vec::new();

        'search: loop {
            phase = match phase {
                SearchPhase::Growing | SearchPhase::Repairing | SearchPhase::Refining => SearchPhase::Checking,
                other => other,
            };

            violations.clear();
            for term in &self.terms {
                term.violations(run.state.selection(), &mut violations);
            }
            let cost = run.cost();
            debug!(iteration = iterations, %phase, cost, violations = violations.len(), "evaluated selection");

            if best.as_ref().map_or(true, |b| b.improved_by(violations.len(), cost)) {
                best = Some(Best { violations: violations.len(), cost, selection: run.state.selection().clone() });
            }

            if let Some(&pair) = violations.first() {
                run.branch(pair);
                // Depth first over removals until one yields a spanning tree
                loop {
                    if iterations >= self.config.num_iterations {
                        phase = SearchPhase::BudgetExhausted;
                        break 'search;
                    }
                    let Some(branch) = run.pending.pop() else {
                        debug!("every removal has been tried");
                        phase = SearchPhase::Converged;
                        break 'search;
                    };
                    phase = SearchPhase::Repairing;
                    iterations += 1;
                    if run.try_remove(branch) {
                        break;
                    }
                }
                continue;
            }

            if !self.config.refine {
                phase = SearchPhase::Converged;
                break;
            }
            if iterations >= self.config.num_iterations {
                phase = SearchPhase::BudgetExhausted;
                break;
            }
            match run.best_swap() {
                Some((arc, delta)) => {
                    phase = SearchPhase::Refining;
                    trace!(arc = arc.0, delta, "applying parent swap");
                    run.state.reparent(graph, arc);
                    iterations += 1;
                }
                None => {
                    phase = SearchPhase::Converged;
                    break;
                }
            }
        }

        let outcome = match best {
            Some(best) => {
                *selection = best.selection;
                SearchOutcome { value: best.cost, constraints_fulfilled: best.violations == 0, iterations, phase }
            }
            None => {
                selection.reset(graph, false);
                SearchOutcome { value: 0.0, constraints_fulfilled: true, iterations, phase }
            }
        };
        info!(
            value = outcome.value,
            fulfilled = outcome.constraints_fulfilled,
            iterations = outcome.iterations,
            phase = %outcome.phase,
            "search finished"
        );
        outcome
    }
}

struct Best {
    violations: usize,
    cost: f64,
    selection: ArcSelection,
}

impl Best {
    fn improved_by(&self, violations: usize, cost: f64) -> bool {
        violations < self.violations || (violations == self.violations && cost < self.cost)
    }
}

/// A tree to resume from, with one member of a violated pair to remove.
struct Branch {
    state: TreeState,
    member: Edge,
    selected: ArcId,
}

/// Mutable state of one `find` call.
struct Run<'s, 'a> {
    search: &'s HostSearch<'a>,
    priors: ArcWeights,
    state: TreeState,
    pending: Vec<Branch>,
}

impl Run<'_, '_> {
    fn cost(&self) -> f64 {
        self.search.terms.iter().map(|t| t.cost(self.state.selection())).sum()
    }

    fn admits(&self, proposal: &Proposal<'_>) -> bool {
        self.search.terms.iter().all(|t| t.admits(proposal))
    }

    /// Replaces the tree by the minimum arborescence under the priors.
    fn span_minimum(&mut self) {
        let graph = self.search.graph;
        self.state = TreeState::new(graph);
        for arc in arborescence::min_arborescence(graph, &self.priors) {
            self.state.attach(graph, arc);
        }
    }

    /// Attaches every detached node reachable over non-banned arcs, cheapest
    /// prior first. Arcs that would create a violation are taken only when
    /// nothing else reaches a node.
    fn grow(&mut self) {
        let graph = self.search.graph;
        let mut heap = BinaryHeap::new();

        for node in graph.nodes() {
            if self.state.is_attached(node) {
                self.push_out_arcs(&mut heap, node);
            }
        }

        while let Some(candidate) = heap.pop() {
            let target = graph.target(candidate.arc);
            if self.state.is_attached(target) {
                continue;
            }
            let violates = !self.admits(&Proposal::new(self.state.selection(), None, candidate.arc));
            if violates != candidate.violates {
                heap.push(Candidate { violates, ..candidate });
                continue;
            }

            trace!(arc = candidate.arc.0, prior = candidate.prior, violates, "attaching");
            self.state.attach(graph, candidate.arc);
            self.push_out_arcs(&mut heap, target);
        }
    }

    fn push_out_arcs(&self, heap: &mut BinaryHeap<Candidate>, node: NodeId) {
        let graph = self.search.graph;
        for arc in graph.out_arcs(node) {
            if self.state.is_banned(arc) || self.state.is_attached(graph.target(arc)) {
                continue;
            }
            let violates = !self.admits(&Proposal::new(self.state.selection(), None, arc));
            heap.push(Candidate { violates, prior: self.priors[arc], arc });
        }
    }

    /// Queues the removal of either member of a violated pair. The member
    /// whose selected arc has the larger prior is tried first.
    fn branch(&mut self, pair: &ExclusivePair) {
        let (Some(first), Some(second)) = (self.selected_arc(&pair.first), self.selected_arc(&pair.second)) else {
            return;
        };

        let first_loses = match self.priors[first].total_cmp(&self.priors[second]) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => first > second,
        };
        let (loser, winner) = if first_loses {
            ((&pair.first, first), (&pair.second, second))
        } else {
            ((&pair.second, second), (&pair.first, first))
        };

        for (member, selected) in [winner, loser] {
            self.pending.push(Branch { state: self.state.clone(), member: member.clone(), selected });
        }
    }

    fn selected_arc(&self, edge: &Edge) -> Option<ArcId> {
        edge.iter().find(|&arc| self.state.selection()[arc])
    }

    /// Resumes from the branch's tree, bans its member and regrows what hung
    /// below it. False if some detached node cannot be reattached.
    fn try_remove(&mut self, branch: Branch) -> bool {
        let graph = self.search.graph;
        let Branch { state, member, selected } = branch;
        self.state = state;

        for arc in &member {
            self.state.ban(arc);
        }
        let detached = self.state.detach_subtree(graph, graph.target(selected));
        self.grow();

        let reattached = detached.iter().all(|&node| self.state.is_attached(node));
        if reattached {
            debug!(removed = selected.0, "removed violating member");
        } else {
            trace!(arc = selected.0, "removal disconnects the tree");
        }
        reattached
    }

    /// The admissible parent swap with the largest cost decrease beyond
    /// `epsilon`, ties by lower arc id.
    fn best_swap(&self) -> Option<(ArcId, f64)> {
        let graph = self.search.graph;
        let tour = self.state.euler_tour(graph);
        let selection = self.state.selection();
        let mut best: Option<(ArcId, f64)> = None;

        for arc in graph.arcs() {
            if selection[arc] || self.state.is_banned(arc) {
                continue;
            }
            let (source, target) = (graph.source(arc), graph.target(arc));
            if target == graph.root() || !self.state.is_attached(target) || !self.state.is_attached(source) {
                continue;
            }
            if tour.is_in_subtree(target, source) {
                continue;
            }

            let proposal = Proposal::new(selection, self.state.parent(target), arc);
            if !self.admits(&proposal) {
                continue;
            }
            let delta: f64 = self.search.terms.iter().map(|t| t.swap_delta(&proposal)).sum();
            if delta < -self.search.config.epsilon && best.map_or(true, |(_, d)| delta < d) {
                best = Some((arc, delta));
            }
        }
        best
    }
}

/// Heap entry: non-violating before violating, then lower prior, then lower id.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    violates: bool,
    prior: f64,
    arc: ArcId,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the maximum
        self.violates
            .cmp(&other.violates)
            .then_with(|| self.prior.total_cmp(&other.prior))
            .then_with(|| self.arc.cmp(&other.arc))
            .reverse()
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Candidate {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ArcType, ArcTypes};
    use crate::terms::{CandidateConflictTerm, ExplicitWeightTerm, MultiArcFactors, MultiFactorTerm};
    use rstest::rstest;

    fn build(undirected: bool, nodes: usize, arcs: &[(u32, u32, f64, ArcType)]) -> (Graph, ArcWeights, ArcTypes) {
        let mut graph = Graph::new();
        graph.set_undirected(undirected);
        let mut weights = ArcWeights::new(&graph);
        let mut types = ArcTypes::new(&graph);
        for _ in 0..nodes {
            graph.add_node();
        }
        for &(u, v, w, kind) in arcs {
            let edge = graph.add_edge(NodeId(u), NodeId(v)).unwrap();
            for arc in &edge {
                weights[arc] = w;
                types[arc] = kind;
            }
        }
        (graph, weights, types)
    }

    #[test]
    fn empty_graph_is_a_trivial_success() {
        let graph = Graph::new();
        let search = HostSearch::new(&graph);
        let mut selection = ArcSelection::new(&graph);
        let outcome = search.find(&mut selection);

        assert_eq!(outcome.value, 0.0);
        assert!(outcome.constraints_fulfilled);
        assert_eq!(selection.count_selected(), 0);
    }

    #[test]
    fn picks_the_cheapest_arborescence_without_constraints() {
        use ArcType::Link;
        let (graph, weights, _) = build(false, 4, &[(0, 1, 3.0, Link), (0, 2, 1.0, Link), (2, 1, 1.0, Link), (1, 3, 1.0, Link), (2, 3, 5.0, Link)]);
        let mut search = HostSearch::new(&graph);
        search.add_term(ExplicitWeightTerm::new(&graph, &weights));

        let mut selection = ArcSelection::new(&graph);
        let outcome = search.find(&mut selection);

        assert!(outcome.constraints_fulfilled);
        assert_eq!(outcome.value, 3.0);
        assert_eq!(outcome.phase, SearchPhase::Converged);
        assert_eq!(selection.selected().collect::<Vec<_>>(), vec![ArcId(1), ArcId(2), ArcId(3)]);
    }

    #[test]
    fn starts_from_the_minimum_arborescence() {
        use ArcType::Link;
        // Greedy growth would take 0->1 (2) before 0->2 (3) reveals the free arc 2->1
        let (graph, weights, _) = build(false, 3, &[(0, 1, 2.0, Link), (0, 2, 3.0, Link), (2, 1, 0.0, Link)]);
        let mut search = HostSearch::new(&graph).with_config(SearchConfig { refine: false, ..SearchConfig::default() });
        search.add_term(ExplicitWeightTerm::new(&graph, &weights));

        let mut selection = ArcSelection::new(&graph);
        let outcome = search.find(&mut selection);
        assert_eq!(outcome.value, 3.0);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.phase, SearchPhase::Converged);
        assert_eq!(selection.selected().collect::<Vec<_>>(), vec![ArcId(1), ArcId(2)]);
    }

    #[rstest]
    #[case(true, 2.2, 1)]
    #[case(false, 2.3, 0)]
    fn refinement_follows_exact_factor_costs(#[case] refine: bool, #[case] value: f64, #[case] iterations: usize) {
        use ArcType::Link;
        // The factor on {0->2, 2->1} lowers the prior of 0->2 below 1->2, but
        // only pays off if 2->1 is selected too
        let (graph, weights, _) =
            build(false, 3, &[(0, 1, 1.0, Link), (0, 2, 1.3, Link), (1, 2, 1.2, Link), (2, 1, 10.0, Link)]);
        let mut factors = MultiArcFactors::new();
        factors.insert(vec![ArcId(1), ArcId(3)], -1.0);

        let mut search = HostSearch::new(&graph).with_config(SearchConfig { refine, ..SearchConfig::default() });
        search.add_term(ExplicitWeightTerm::new(&graph, &weights));
        search.add_term(MultiFactorTerm::new(&graph, &factors));

        let mut selection = ArcSelection::new(&graph);
        let outcome = search.find(&mut selection);
        assert!((outcome.value - value).abs() < 1e-9, "{}", outcome.value);
        assert_eq!(outcome.iterations, iterations);
        assert_eq!(outcome.phase, SearchPhase::Converged);
        assert!(topology::validate_arborescence(&graph, &selection).is_ok());
    }

    #[test]
    fn backtracks_out_of_dead_ends() {
        use ArcType::{Conflict, Link};
        // The cheapest tree hangs 2 below 4 over a conflict arc. Every repair
        // that keeps 0->4 ends without a feasible tree.
        let (graph, weights, types) = build(
            true,
            6,
            &[
                (0, 2, 0.6, Link),
                (0, 3, 0.5, Link),
                (0, 4, 0.2, Link),
                (1, 2, 0.3, Link),
                (1, 5, 0.8, Link),
                (2, 3, 0.8, Link),
                (3, 4, 0.8, Link),
                (2, 4, 0.0, Conflict),
                (2, 5, 0.0, Conflict),
            ],
        );
        let mut search = HostSearch::new(&graph);
        search.add_term(ExplicitWeightTerm::new(&graph, &weights));
        search.add_term(CandidateConflictTerm::new(&graph, &types).unwrap());

        let mut selection = ArcSelection::new(&graph);
        let outcome = search.find(&mut selection);

        assert!(outcome.constraints_fulfilled);
        assert!((outcome.value - 1.4).abs() < 1e-9, "{}", outcome.value);
        assert_eq!(outcome.phase, SearchPhase::Converged);
        assert!(outcome.iterations < search.config().num_iterations);
        // 0->2, 0->3, 2->1, 2->4 and 2->5
        let chosen: Vec<_> = selection.selected().map(|arc| arc.0).collect();
        assert_eq!(chosen, vec![0, 2, 7, 14, 16]);
        assert!(topology::validate_arborescence(&graph, &selection).is_ok());
    }

    #[test]
    fn exhausted_removals_end_the_search_early() {
        use ArcType::{Conflict, Link};
        // 3 hangs only off 1 and 4 only off 2, but links at 1 and 2 exclude each other
        let (graph, weights, types) = build(
            true,
            5,
            &[(0, 1, 0.1, Link), (0, 2, 0.1, Link), (1, 3, 0.1, Link), (2, 4, 0.1, Link), (1, 2, 0.0, Conflict)],
        );
        let mut search = HostSearch::new(&graph);
        search.add_term(ExplicitWeightTerm::new(&graph, &weights));
        search.add_term(CandidateConflictTerm::new(&graph, &types).unwrap());

        let mut selection = ArcSelection::new(&graph);
        let outcome = search.find(&mut selection);

        assert!(!outcome.constraints_fulfilled);
        assert_eq!(outcome.phase, SearchPhase::Converged);
        assert_eq!(outcome.iterations, 4);
        assert_eq!(selection.count_selected(), 4);
        assert!(topology::validate_arborescence(&graph, &selection).is_ok());
    }

    #[test]
    fn unreachable_nodes_stay_unselected() {
        use ArcType::Link;
        let (graph, weights, _) = build(false, 4, &[(0, 1, 1.0, Link), (2, 3, 1.0, Link)]);
        let mut search = HostSearch::new(&graph);
        search.add_term(ExplicitWeightTerm::new(&graph, &weights));

        let mut selection = ArcSelection::new(&graph);
        let outcome = search.find(&mut selection);
        assert!(outcome.constraints_fulfilled);
        assert_eq!(outcome.value, 1.0);
        assert_eq!(selection.count_selected(), 1);
    }

    #[rstest]
    #[case(0, SearchPhase::BudgetExhausted)]
    #[case(100, SearchPhase::Converged)]
    fn conflicts_are_repaired_within_budget(#[case] budget: usize, #[case] phase: SearchPhase) {
        use ArcType::{Conflict, Link};
        let (graph, weights, types) = build(
            true,
            4,
            &[(0, 1, 0.5, Link), (0, 2, 0.25, Link), (0, 3, 0.25, Link), (1, 2, 0.0, Conflict), (1, 3, 0.0, Conflict)],
        );
        let mut search = HostSearch::new(&graph).with_config(SearchConfig { num_iterations: budget, ..SearchConfig::default() });
        search.add_term(ExplicitWeightTerm::new(&graph, &weights));
        search.add_term(CandidateConflictTerm::new(&graph, &types).unwrap());

        let mut selection = ArcSelection::new(&graph);
        let outcome = search.find(&mut selection);

        assert_eq!(outcome.phase, phase);
        assert_eq!(outcome.constraints_fulfilled, budget > 0);
        if budget > 0 {
            assert!((outcome.value - 0.5).abs() < 1e-9);
            assert!(topology::validate_arborescence(&graph, &selection).is_ok());
        }
    }

    #[test]
    fn candidate_ordering_prefers_clean_then_cheap_then_old() {
        let mut heap = BinaryHeap::new();
        heap.push(Candidate { violates: true, prior: -5.0, arc: ArcId(0) });
        heap.push(Candidate { violates: false, prior: 1.0, arc: ArcId(3) });
        heap.push(Candidate { violates: false, prior: 1.0, arc: ArcId(2) });
        heap.push(Candidate { violates: false, prior: 0.5, arc: ArcId(4) });

        let order: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|c| c.arc.0).collect();
        assert_eq!(order, vec![4, 2, 3, 0]);
    }
}
