//! # Ripple Sim
//!
//! Deterministic discrete-event simulation of actors exchanging messages
//! over bounded FIFO channels.
//!
//! Each tick the [`World`] asks every [`Process`] which [`Step`]s it is
//! willing to run, flattens all of them into one candidate list, picks one
//! uniformly with a seeded generator and runs it to completion. Message
//! deliveries append [`Event`]s to an ordered log; with a nonzero seed the
//! log is identical across runs.

pub mod channel;
pub mod config;
pub mod event;
pub mod invariants;
pub mod message;
pub mod process;
pub mod world;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use channel::{Channel, ChannelId, ChannelIndex, ChannelKey, Envelope, SendError};
pub use config::SimulationConfig;
pub use event::Event;
pub use invariants::{
    ChannelCapacity, Invariant, InvariantViolation, RecordedViolation, Severity, WorldInvariant,
};
pub use message::Message;
pub use process::{Process, Step};
pub use world::{RunOutcome, StepContext, World, WorldBuilder, WorldView};

/// Logical time, counted in executed steps
pub type Tick = u64;

/// Stable identity of an actor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `(actor, channel name)` pair naming one channel of a world
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    pub actor: ActorId,
    pub channel: String,
}

impl Address {
    pub fn new(actor: impl Into<ActorId>, channel: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            channel: channel.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.actor, self.channel)
    }
}

/// Configuration errors, all detected before the first tick
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("Duplicate channel address: {0}")]
    DuplicateChannel(Address),

    #[error("Duplicate process id: {0}")]
    DuplicateProcess(ActorId),

    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),
}
