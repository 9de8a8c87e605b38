//! # Ripple
//!
//! Describe a communicating system as actors exchanging messages over
//! bounded channels, run it as a reproducible simulation, and verify CTL
//! properties over an explicit finite-state model of its behavior.
//!
//! This crate re-exports the workspace crates and ships the reference models
//! used by the CLI, the benches and the integration tests.

pub mod models;

pub use ripple_core::{Graph, GraphDescription, GraphError, StateDescription, StateId, StateSet};
pub use ripple_ctl::{parse, CheckResult, CtlChecker, EvalStats, Formula, ParseError};
pub use ripple_metrics::{InMemoryCollector, MetricsCollector, MetricsError, RunMetrics};
pub use ripple_sim::{
    ActorId, Address, Channel, Event, Message, Process, RunOutcome, SimulationConfig, Step,
    StepContext, Tick, World, WorldBuilder, WorldError, WorldView,
};
