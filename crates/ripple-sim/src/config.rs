//! Simulation run configuration

use crate::WorldError;
use serde::{Deserialize, Serialize};

/// Knobs for one simulation run
///
/// Every field has a default, so a partial JSON document such as
/// `{"seed": 42}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Scheduler seed; 0 selects a time-derived seed
    pub seed: u64,

    /// Upper bound on ticks executed by [`crate::World::run`]
    pub max_steps: usize,

    /// Evaluate world invariants after every step
    pub check_invariants: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_steps: 1000,
            check_invariants: true,
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn validate(&self) -> Result<(), WorldError> {
        if self.max_steps == 0 {
            return Err(WorldError::InvalidConfig(
                "max_steps must be positive".into(),
            ));
        }
        Ok(())
    }
}
