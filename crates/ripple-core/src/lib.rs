//! # Ripple Core
//!
//! Explicit labeled transition systems (Kripke structures) and the state
//! sets computed over them. This crate is the substrate shared by the CTL
//! evaluator and by anything that builds graphs from simulation models.

pub mod graph;
pub mod state_set;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use graph::{Graph, GraphDescription, StateDescription};
pub use state_set::{StateSet, StateSetIter};

/// Opaque handle for one state of a [`Graph`]
///
/// Handles are dense indices assigned in insertion order and stay valid for
/// the lifetime of the graph that issued them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StateId(usize);

impl StateId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of this state in its graph's arena
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Errors raised while building a graph by name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Unknown state: {0}")]
    UnknownState(String),

    #[error("Duplicate state in graph description: {0}")]
    DuplicateState(String),
}
