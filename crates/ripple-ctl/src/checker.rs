//! Verdicts of formulas against a graph's initial states

use crate::eval::{EvalStats, Evaluator};
use crate::Formula;
use ripple_core::{Graph, StateId, StateSet};
use tracing::debug;

/// Outcome of checking one formula
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub formula: Formula,
    /// Every state satisfying the formula
    pub satisfying: StateSet,
    /// Initial states that do not satisfy the formula
    pub violating_initial: Vec<StateId>,
    pub stats: EvalStats,
}

impl CheckResult {
    /// True when every initial state satisfies the formula
    ///
    /// A graph without initial states holds every formula vacuously.
    pub fn holds(&self) -> bool {
        self.violating_initial.is_empty()
    }
}

/// Checks CTL formulas against the initial states of a graph
pub struct CtlChecker<'g> {
    graph: &'g Graph,
}

impl<'g> CtlChecker<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn sat(&self, formula: &Formula) -> StateSet {
        formula.sat(self.graph)
    }

    pub fn holds_initially(&self, formula: &Formula) -> bool {
        let satisfying = self.sat(formula);
        self.graph
            .initial()
            .iter()
            .all(|&id| satisfying.contains(id))
    }

    /// Holds at a specific named state; `None` if the name is unknown
    pub fn holds_at(&self, formula: &Formula, state: &str) -> Option<bool> {
        let id = self.graph.state_id(state)?;
        Some(self.sat(formula).contains(id))
    }

    pub fn check(&self, formula: &Formula) -> CheckResult {
        let mut evaluator = Evaluator::new(self.graph);
        let satisfying = evaluator.sat(formula);
        let violating_initial: Vec<StateId> = self
            .graph
            .initial()
            .iter()
            .copied()
            .filter(|&id| !satisfying.contains(id))
            .collect();

        debug!(
            %formula,
            satisfying = satisfying.len(),
            violating = violating_initial.len(),
            "checked formula"
        );

        CheckResult {
            formula: formula.clone(),
            satisfying,
            violating_initial,
            stats: evaluator.into_stats(),
        }
    }
}
