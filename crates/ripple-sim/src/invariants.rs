//! World invariant checking
//!
//! Invariants are evaluated against a read-only [`WorldView`] after every
//! executed step when checking is enabled. Violations are recorded on the
//! world with the tick at which they were observed.

use crate::world::WorldView;
use crate::{Address, Tick};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an invariant violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational - not a problem
    Info,
    /// Warning - should investigate
    Warning,
    /// High - the model is probably wrong
    High,
    /// Critical - engine guarantees no longer hold
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Types of invariant violations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvariantViolation {
    /// A channel holds more messages than its capacity
    CapacityExceeded {
        address: Address,
        len: usize,
        capacity: usize,
    },
    /// Model-specific invariant violation
    Custom { name: String, description: String },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                address,
                len,
                capacity,
            } => write!(
                f,
                "Channel {} holds {} messages, capacity {}",
                address, len, capacity
            ),
            Self::Custom { name, description } => write!(f, "{}: {}", name, description),
        }
    }
}

/// Trait for invariants that must hold over the whole world
pub trait WorldInvariant<P> {
    /// Check if invariant holds
    fn check(&self, world: &WorldView<'_, P>) -> Result<(), InvariantViolation>;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Description of what this invariant ensures
    fn description(&self) -> &str;

    /// Severity if violated
    fn severity(&self) -> Severity;
}

/// Helper struct to create inline invariants from closures
pub struct Invariant<F> {
    name: &'static str,
    description: &'static str,
    severity: Severity,
    check_fn: F,
}

impl<F> Invariant<F> {
    pub fn new<P>(
        name: &'static str,
        description: &'static str,
        severity: Severity,
        check_fn: F,
    ) -> Self
    where
        F: Fn(&WorldView<'_, P>) -> Result<(), InvariantViolation>,
    {
        Self {
            name,
            description,
            severity,
            check_fn,
        }
    }
}

impl<P, F> WorldInvariant<P> for Invariant<F>
where
    F: Fn(&WorldView<'_, P>) -> Result<(), InvariantViolation>,
{
    fn check(&self, world: &WorldView<'_, P>) -> Result<(), InvariantViolation> {
        (self.check_fn)(world)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn severity(&self) -> Severity {
        self.severity
    }
}

/// Every channel holds at most `capacity` messages
///
/// Installed on every world by [`crate::WorldBuilder::build`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelCapacity;

impl<P> WorldInvariant<P> for ChannelCapacity {
    fn check(&self, world: &WorldView<'_, P>) -> Result<(), InvariantViolation> {
        match world.channels().find(|c| c.len() > c.capacity()) {
            Some(channel) => Err(InvariantViolation::CapacityExceeded {
                address: channel.address().clone(),
                len: channel.len(),
                capacity: channel.capacity(),
            }),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "ChannelCapacity"
    }

    fn description(&self) -> &str {
        "0 <= len <= capacity for every channel"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }
}

/// A violation observed during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedViolation {
    pub time: Tick,
    pub invariant: String,
    pub severity: Severity,
    pub violation: InvariantViolation,
}

impl fmt::Display for RecordedViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[t={}] {} {}: {}",
            self.time, self.severity, self.invariant, self.violation
        )
    }
}
