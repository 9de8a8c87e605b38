//! Backward fixpoint evaluation of CTL formulas
//!
//! Every temporal operator is computed over whole state sets using the two
//! one-step predecessor operators:
//!
//! - `pre_e(W)`: states with at least one successor in `W`
//! - `pre_a(W)`: states all of whose successors are in `W`; a state with no
//!   successors is vacuously included
//!
//! `EF`, `AF`, `EU` and `AU` are least fixpoints grown from the target set,
//! `EG` and `AG` are greatest fixpoints shrunk from the operand set. A round
//! that changes the candidate set adds or removes at least one state, so no
//! fixpoint takes more than `|States|` changing rounds.

use crate::Formula;
use ripple_core::{Graph, StateSet};
use serde::Serialize;
use std::fmt;
use tracing::trace;

/// Temporal operators that are computed as fixpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FixpointOp {
    Ef,
    Af,
    Eg,
    Ag,
    Eu,
    Au,
}

impl FixpointOp {
    /// Least fixpoints grow, greatest fixpoints shrink
    pub fn is_least(&self) -> bool {
        matches!(self, Self::Ef | Self::Af | Self::Eu | Self::Au)
    }
}

impl fmt::Display for FixpointOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ef => "EF",
            Self::Af => "AF",
            Self::Eg => "EG",
            Self::Ag => "AG",
            Self::Eu => "EU",
            Self::Au => "AU",
        };
        f.write_str(name)
    }
}

/// Record of one fixpoint computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixpointTrace {
    pub operator: FixpointOp,
    /// Iterations that changed the candidate set
    pub rounds: usize,
    /// Size of the converged set
    pub result_size: usize,
}

/// Fixpoint bookkeeping gathered during one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvalStats {
    pub fixpoints: Vec<FixpointTrace>,
}

impl EvalStats {
    /// Largest number of changing rounds any fixpoint needed
    pub fn max_rounds(&self) -> usize {
        self.fixpoints.iter().map(|t| t.rounds).max().unwrap_or(0)
    }

    pub fn total_rounds(&self) -> usize {
        self.fixpoints.iter().map(|t| t.rounds).sum()
    }
}

/// States with at least one successor in `target`
pub fn pre_e(graph: &Graph, target: &StateSet) -> StateSet {
    let mut out = graph.empty_set();
    for state in target {
        out.extend(graph.pred(state).iter().copied());
    }
    out
}

/// States all of whose successors are in `target`, deadlocks included
pub fn pre_a(graph: &Graph, target: &StateSet) -> StateSet {
    graph.set_of(
        graph
            .states()
            .filter(|&s| graph.succ(s).iter().all(|&t| target.contains(t))),
    )
}

/// Evaluates formulas against one graph, collecting [`EvalStats`]
pub struct Evaluator<'g> {
    graph: &'g Graph,
    stats: EvalStats,
}

impl<'g> Evaluator<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            stats: EvalStats::default(),
        }
    }

    pub fn stats(&self) -> &EvalStats {
        &self.stats
    }

    pub fn into_stats(self) -> EvalStats {
        self.stats
    }

    /// Set of states satisfying `formula`
    pub fn sat(&mut self, formula: &Formula) -> StateSet {
        let graph = self.graph;
        match formula {
            Formula::True => graph.full_set(),
            Formula::False => graph.empty_set(),
            Formula::Atom(name) => graph.states_with_label(name),
            Formula::Not(f) => self.sat(f).complement(),
            Formula::And(f, g) => {
                let mut out = self.sat(f);
                out.intersect_with(&self.sat(g));
                out
            }
            Formula::Or(f, g) => {
                let mut out = self.sat(f);
                out.union_with(&self.sat(g));
                out
            }
            Formula::Ex(f) => pre_e(graph, &self.sat(f)),
            Formula::Ax(f) => pre_a(graph, &self.sat(f)),
            Formula::Ef(f) => {
                let target = self.sat(f);
                self.least(FixpointOp::Ef, target, None, pre_e)
            }
            Formula::Af(f) => {
                let target = self.sat(f);
                self.least(FixpointOp::Af, target, None, pre_a)
            }
            Formula::Eu(f, g) => {
                let hold = self.sat(f);
                let target = self.sat(g);
                self.least(FixpointOp::Eu, target, Some(&hold), pre_e)
            }
            Formula::Au(f, g) => {
                let hold = self.sat(f);
                let target = self.sat(g);
                self.least(FixpointOp::Au, target, Some(&hold), pre_a)
            }
            Formula::Eg(f) => {
                let start = self.sat(f);
                self.greatest(FixpointOp::Eg, start, pre_e)
            }
            Formula::Ag(f) => {
                let start = self.sat(f);
                self.greatest(FixpointOp::Ag, start, pre_a)
            }
        }
    }

    /// `Y0 = target`, `Y(i+1) = Y(i) ∪ (hold ∩ pre(Y(i)))`; `hold = None` means all states
    fn least(
        &mut self,
        operator: FixpointOp,
        target: StateSet,
        hold: Option<&StateSet>,
        pre: fn(&Graph, &StateSet) -> StateSet,
    ) -> StateSet {
        let mut current = target;
        let mut rounds = 0;
        loop {
            let mut frontier = pre(self.graph, &current);
            if let Some(hold) = hold {
                frontier.intersect_with(hold);
            }
            if !current.union_with(&frontier) {
                break;
            }
            rounds += 1;
            trace!(%operator, rounds, size = current.len(), "fixpoint round");
        }
        self.record(operator, rounds, &current);
        current
    }

    /// `Y0 = start`, `Y(i+1) = Y(i) ∩ pre(Y(i))`
    fn greatest(
        &mut self,
        operator: FixpointOp,
        start: StateSet,
        pre: fn(&Graph, &StateSet) -> StateSet,
    ) -> StateSet {
        let mut current = start;
        let mut rounds = 0;
        loop {
            let keep = pre(self.graph, &current);
            if !current.intersect_with(&keep) {
                break;
            }
            rounds += 1;
            trace!(%operator, rounds, size = current.len(), "fixpoint round");
        }
        self.record(operator, rounds, &current);
        current
    }

    fn record(&mut self, operator: FixpointOp, rounds: usize, result: &StateSet) {
        debug_assert!(rounds <= self.graph.len());
        self.stats.fixpoints.push(FixpointTrace {
            operator,
            rounds,
            result_size: result.len(),
        });
    }
}

impl Formula {
    /// Set of states of `graph` that satisfy this formula
    pub fn sat(&self, graph: &Graph) -> StateSet {
        Evaluator::new(graph).sat(self)
    }

    /// Like [`Formula::sat`], also returning fixpoint statistics
    pub fn sat_with_stats(&self, graph: &Graph) -> (StateSet, EvalStats) {
        let mut evaluator = Evaluator::new(graph);
        let result = evaluator.sat(self);
        (result, evaluator.into_stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// a -> b -> c, c is a deadlock; d <-> e form a cycle, d -> a
    fn sample() -> Graph {
        let mut g = Graph::new();
        let a = g.add_state("a", ["p"]);
        let b = g.add_state("b", ["p"]);
        let c = g.add_state("c", ["q"]);
        let d = g.add_state("d", ["p"]);
        let e = g.add_state("e", ["p", "q"]);
        g.add_edge(a, b);
        g.add_edge(b, c);
        g.add_edge(d, e);
        g.add_edge(e, d);
        g.add_edge(d, a);
        g.mark_initial(a);
        g
    }

    fn names(graph: &Graph, set: &StateSet) -> Vec<String> {
        graph.names_of(set).map(str::to_string).collect()
    }

    #[test]
    fn test_pre_operators() {
        let g = sample();
        let c = g.set_of([g.state_id("c").unwrap()]);

        assert_eq!(names(&g, &pre_e(&g, &c)), vec!["b"]);
        // c has no successors, so it is vacuously in pre_a of anything
        assert_eq!(names(&g, &pre_a(&g, &c)), vec!["b", "c"]);
        assert_eq!(names(&g, &pre_a(&g, &g.empty_set())), vec!["c"]);
    }

    #[test]
    fn test_boolean_connectives() {
        let g = sample();
        let p_and_q = Formula::and(Formula::atom("p"), Formula::atom("q"));
        assert_eq!(names(&g, &p_and_q.sat(&g)), vec!["e"]);

        let not_p = Formula::atom("p").not();
        assert_eq!(names(&g, &not_p.sat(&g)), vec!["c"]);

        assert_eq!(Formula::True.sat(&g), g.full_set());
        assert!(Formula::False.sat(&g).is_empty());
    }

    #[test]
    fn test_ex_ax() {
        let g = sample();
        let q = Formula::atom("q");
        assert_eq!(names(&g, &q.clone().ex().sat(&g)), vec!["b", "d"]);
        // d has successors e (q) and a (not q)
        assert_eq!(names(&g, &q.ax().sat(&g)), vec!["b", "c"]);
    }

    #[test]
    fn test_ef_and_eg() {
        let g = sample();
        let ef_q = Formula::atom("q").ef().sat(&g);
        assert_eq!(ef_q, g.full_set());

        // only the d <-> e cycle keeps p forever; the a -> b -> c path dies at c
        let eg_p = Formula::atom("p").eg().sat(&g);
        assert_eq!(names(&g, &eg_p), vec!["d", "e"]);
    }

    #[test]
    fn test_af_and_ag() {
        let g = sample();
        // d may loop through e forever but e is labeled q
        assert_eq!(Formula::atom("q").af().sat(&g), g.full_set());

        let ag_p = Formula::atom("p").ag().sat(&g);
        // d and e both lead out of p through a -> b -> c
        assert!(ag_p.is_empty());
        let ag_q = Formula::atom("q").ag().sat(&g);
        assert_eq!(names(&g, &ag_q), vec!["c"]);
    }

    #[test]
    fn test_until() {
        let g = sample();
        let eu = Formula::eu(Formula::atom("p"), Formula::atom("q")).sat(&g);
        assert_eq!(eu, g.full_set());

        let mut only_d = Graph::new();
        let d = only_d.add_state("d", ["p"]);
        let x = only_d.add_state("x", Vec::<String>::new());
        let y = only_d.add_state("y", ["q"]);
        only_d.add_edge(d, x);
        only_d.add_edge(d, y);
        let au = Formula::au(Formula::atom("p"), Formula::atom("q")).sat(&only_d);
        let eu = Formula::eu(Formula::atom("p"), Formula::atom("q")).sat(&only_d);
        assert_eq!(names(&only_d, &au), vec!["y"]);
        assert_eq!(names(&only_d, &eu), vec!["d", "y"]);
    }

    #[test]
    fn test_branching_shared_successor_eg() {
        // Two branches reach the same p-cycle; every p state on the way keeps EG p.
        let mut g = Graph::new();
        let root = g.add_state("root", ["p"]);
        let left = g.add_state("left", ["p"]);
        let right = g.add_state("right", ["p"]);
        let hub = g.add_state("hub", ["p"]);
        g.add_edge(root, left);
        g.add_edge(root, right);
        g.add_edge(left, hub);
        g.add_edge(right, hub);
        g.add_edge(hub, hub);

        let eg = Formula::atom("p").eg().sat(&g);
        let ag = Formula::atom("p").ag().sat(&g);
        assert_eq!(eg, g.full_set());
        assert_eq!(ag, g.full_set());
    }

    #[test]
    fn test_stats_respect_state_bound() {
        let mut g = Graph::new();
        let n = 12;
        let ids: Vec<_> = (0..n)
            .map(|i| {
                let labels: Vec<&str> = if i == n - 1 { vec!["goal"] } else { vec![] };
                g.add_state(format!("s{}", i), labels)
            })
            .collect();
        for pair in ids.windows(2) {
            g.add_edge(pair[0], pair[1]);
        }

        let (result, stats) = Formula::atom("goal").ef().sat_with_stats(&g);
        assert_eq!(result, g.full_set());
        assert_eq!(stats.fixpoints.len(), 1);
        assert_eq!(stats.fixpoints[0].operator, FixpointOp::Ef);
        assert_eq!(stats.max_rounds(), n - 1);
        assert!(stats.max_rounds() <= g.len());
    }
}
