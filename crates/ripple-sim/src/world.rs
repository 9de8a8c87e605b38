//! The scheduler and event log
//!
//! Each call to [`World::step_random`] polls every process, flattens all
//! offered steps into one candidate list and fires exactly one of them,
//! chosen uniformly with the world's seeded generator. An empty candidate
//! list means the world is quiescent; time does not advance in that case.

use crate::channel::{ChannelIndex, ChannelTable};
use crate::invariants::{ChannelCapacity, RecordedViolation, WorldInvariant};
use crate::process::{Process, ProcessSlot, Slot};
use crate::{
    ActorId, Channel, ChannelKey, Event, Message, SendError, SimulationConfig, Tick, WorldError,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Read-only snapshot handed to [`Process::ready`] and to invariants
pub struct WorldView<'w, P> {
    time: Tick,
    channels: &'w ChannelTable<P>,
}

impl<'w, P> WorldView<'w, P> {
    pub fn time(&self) -> Tick {
        self.time
    }

    /// Panics if `key` names no channel of this world
    pub fn channel(&self, key: impl ChannelKey) -> &'w Channel<P> {
        self.channels.get(key)
    }

    pub fn can_send(&self, key: impl ChannelKey) -> bool {
        self.channels.get(key).can_send()
    }

    pub fn can_recv(&self, key: impl ChannelKey) -> bool {
        self.channels.get(key).can_recv()
    }

    pub fn channels(&self) -> impl Iterator<Item = &'w Channel<P>> + 'w {
        self.channels.iter()
    }

    /// Resolve addresses once, up front
    pub fn index(&self) -> &'w ChannelIndex {
        self.channels.index()
    }
}

/// Mutable access granted to the one step executing this tick
pub struct StepContext<'w, P> {
    time: Tick,
    actor: &'w ActorId,
    channels: &'w mut ChannelTable<P>,
    events: &'w mut Vec<Event<P>>,
    refused_sends: &'w mut u64,
    delivered: bool,
}

impl<'w, P> StepContext<'w, P> {
    pub fn time(&self) -> Tick {
        self.time
    }

    /// Actor whose step is running
    pub fn actor(&self) -> &ActorId {
        self.actor
    }

    pub fn channel(&self, key: impl ChannelKey) -> &Channel<P> {
        self.channels.get(key)
    }

    pub fn can_send(&self, key: impl ChannelKey) -> bool {
        self.channels.get(key).can_send()
    }

    pub fn can_recv(&self, key: impl ChannelKey) -> bool {
        self.channels.get(key).can_recv()
    }

    /// Enqueue `message` on the channel named by `message.to`
    ///
    /// Admission is checked again here. A full channel leaves the buffer
    /// untouched, counts a refused send on the world and returns the message
    /// inside the error; that only happens when the step was built on a
    /// stale guard.
    pub fn send(&mut self, message: Message<P>) -> Result<(), SendError<P>> {
        let now = self.time;
        let channel = self.channels.get_mut(&message.to);
        match channel.enqueue(message, now) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(
                    time = now,
                    actor = %self.actor,
                    to = %err.message.to,
                    capacity = err.capacity,
                    "send refused by full channel"
                );
                *self.refused_sends += 1;
                Err(err)
            }
        }
    }
}

impl<'w, P: Clone> StepContext<'w, P> {
    /// Dequeue the oldest message and log its delivery
    ///
    /// Only the owning actor may receive; anything else is a wiring error
    /// and panics. A step delivers at most one message, so a second
    /// delivery within the same step panics too. An empty channel yields
    /// `None` without side effects.
    pub fn recv(&mut self, key: impl ChannelKey) -> Option<Message<P>> {
        let now = self.time;
        let channel = self.channels.get_mut(key);
        if channel.owner() != self.actor {
            panic!(
                "actor {} cannot receive from channel {} owned by {}",
                self.actor,
                channel.address(),
                channel.owner()
            );
        }

        if self.delivered && channel.can_recv() {
            panic!(
                "actor {} already received a message at tick {}",
                self.actor, now
            );
        }

        let envelope = channel.try_recv()?;
        self.delivered = true;
        let message = envelope.message;
        let queue_delay = now - envelope.enqueued_at;
        debug!(
            time = now,
            from = %message.from,
            to = %message.to,
            queue_delay,
            "delivered message"
        );
        self.events.push(Event {
            time: now,
            from: message.from.clone(),
            to: message.to.clone(),
            payload: message.payload.clone(),
            reply_to: message.reply_to.clone(),
            queue_delay,
        });
        Some(message)
    }
}

/// Result of a bounded run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Steps actually executed
    pub steps: usize,
    /// No process had anything left to do when the run stopped
    pub quiescent: bool,
}

/// Builder for a [`World`]; all configuration errors surface from [`build`]
///
/// [`build`]: WorldBuilder::build
pub struct WorldBuilder<P> {
    config: SimulationConfig,
    channels: Vec<Channel<P>>,
    ids: Vec<ActorId>,
    slots: Vec<Box<dyn Slot<P>>>,
    invariants: Vec<Box<dyn WorldInvariant<P>>>,
}

impl<P: Clone + 'static> Default for WorldBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone + 'static> WorldBuilder<P> {
    pub fn new() -> Self {
        Self {
            config: SimulationConfig::default(),
            channels: Vec::new(),
            ids: Vec::new(),
            slots: Vec::new(),
            invariants: Vec::new(),
        }
    }

    /// Replace the whole configuration, seed included
    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn channel(mut self, channel: Channel<P>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn process<A: Process<P>>(mut self, process: A) -> Self {
        self.ids.push(process.id().clone());
        self.slots.push(Box::new(ProcessSlot::new(process)));
        self
    }

    pub fn invariant(mut self, invariant: impl WorldInvariant<P> + 'static) -> Self {
        self.invariants.push(Box::new(invariant));
        self
    }

    pub fn build(self) -> Result<World<P>, WorldError> {
        self.config.validate()?;

        let mut channels = ChannelTable::new();
        for channel in self.channels {
            if let Err(duplicate) = channels.insert(channel) {
                return Err(WorldError::DuplicateChannel(duplicate.address().clone()));
            }
        }

        let mut seen = HashSet::new();
        for id in &self.ids {
            if !seen.insert(id) {
                return Err(WorldError::DuplicateProcess(id.clone()));
            }
        }

        let seed = match self.config.seed {
            0 => {
                let seed = time_derived_seed();
                info!(seed, "no seed configured, using time-derived seed");
                seed
            }
            seed => seed,
        };

        let mut invariants: Vec<Box<dyn WorldInvariant<P>>> = vec![Box::new(ChannelCapacity)];
        invariants.extend(self.invariants);

        debug!(
            seed,
            processes = self.ids.len(),
            channels = channels.len(),
            "built world"
        );

        Ok(World {
            time: 0,
            seed,
            rng: StdRng::seed_from_u64(seed),
            ids: self.ids,
            slots: self.slots,
            channels,
            events: Vec::new(),
            invariants,
            violations: Vec::new(),
            check_invariants: self.config.check_invariants,
            refused_sends: 0,
            max_steps: self.config.max_steps,
        })
    }
}

fn time_derived_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
        .max(1)
}

/// A running simulation
pub struct World<P> {
    time: Tick,
    seed: u64,
    rng: StdRng,
    ids: Vec<ActorId>,
    slots: Vec<Box<dyn Slot<P>>>,
    channels: ChannelTable<P>,
    events: Vec<Event<P>>,
    invariants: Vec<Box<dyn WorldInvariant<P>>>,
    violations: Vec<RecordedViolation>,
    check_invariants: bool,
    refused_sends: u64,
    max_steps: usize,
}

impl<P: Clone + 'static> World<P> {
    pub fn builder() -> WorldBuilder<P> {
        WorldBuilder::new()
    }

    /// Current logical time; equals the number of executed steps
    pub fn time(&self) -> Tick {
        self.time
    }

    /// Effective seed, after resolving a zero seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Delivery log in tick order
    pub fn events(&self) -> &[Event<P>] {
        &self.events
    }

    /// Panics if `key` names no channel of this world
    pub fn channel(&self, key: impl ChannelKey) -> &Channel<P> {
        self.channels.get(key)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel<P>> {
        self.channels.iter()
    }

    pub fn process_ids(&self) -> &[ActorId] {
        &self.ids
    }

    /// Concrete state of process `id`, if it exists and has type `A`
    pub fn process<A: Process<P>>(&self, id: &str) -> Option<&A> {
        let index = self.ids.iter().position(|a| a.as_str() == id)?;
        self.slots[index].as_any().downcast_ref::<A>()
    }

    /// Sends rejected by a full channel
    pub fn refused_sends(&self) -> u64 {
        self.refused_sends
    }

    pub fn violations(&self) -> &[RecordedViolation] {
        &self.violations
    }

    pub fn add_invariant(&mut self, invariant: impl WorldInvariant<P> + 'static) {
        self.invariants.push(Box::new(invariant));
    }

    pub fn view(&self) -> WorldView<'_, P> {
        WorldView {
            time: self.time,
            channels: &self.channels,
        }
    }

    /// Number of steps offered by all processes right now
    pub fn enabled_count(&mut self) -> usize {
        let view = WorldView {
            time: self.time,
            channels: &self.channels,
        };
        let mut count = 0;
        for slot in &mut self.slots {
            count += slot.poll(&view);
            slot.clear();
        }
        count
    }

    pub fn is_quiescent(&mut self) -> bool {
        self.enabled_count() == 0
    }

    /// Fire one uniformly chosen enabled step
    ///
    /// Returns `false`, leaving time untouched, when nothing is enabled.
    pub fn step_random(&mut self) -> bool {
        let view = WorldView {
            time: self.time,
            channels: &self.channels,
        };
        let mut candidates = Vec::new();
        for (slot_index, slot) in self.slots.iter_mut().enumerate() {
            let offered = slot.poll(&view);
            candidates.extend((0..offered).map(|step_index| (slot_index, step_index)));
        }

        if candidates.is_empty() {
            debug!(time = self.time, "world is quiescent");
            return false;
        }

        let (slot_index, step_index) = candidates[self.rng.gen_range(0..candidates.len())];
        let mut ctx = StepContext {
            time: self.time,
            actor: &self.ids[slot_index],
            channels: &mut self.channels,
            events: &mut self.events,
            refused_sends: &mut self.refused_sends,
            delivered: false,
        };
        let label = self.slots[slot_index].fire(step_index, &mut ctx);
        for slot in &mut self.slots {
            slot.clear();
        }

        debug!(
            time = self.time,
            actor = %self.ids[slot_index],
            step = %label,
            enabled = candidates.len(),
            "executed step"
        );
        self.time += 1;

        if self.check_invariants {
            self.evaluate_invariants();
        }
        true
    }

    /// Step until quiescent or until `max_steps` steps have run
    pub fn run_steps(&mut self, max_steps: usize) -> RunOutcome {
        let mut steps = 0;
        while steps < max_steps {
            if !self.step_random() {
                break;
            }
            steps += 1;
        }
        let quiescent = steps < max_steps || self.is_quiescent();

        info!(
            steps,
            quiescent,
            time = self.time,
            events = self.events.len(),
            "run finished"
        );
        RunOutcome { steps, quiescent }
    }

    /// Run with the configured step bound
    pub fn run(&mut self) -> RunOutcome {
        self.run_steps(self.max_steps)
    }

    fn evaluate_invariants(&mut self) {
        let view = WorldView {
            time: self.time,
            channels: &self.channels,
        };
        for invariant in &self.invariants {
            if let Err(violation) = invariant.check(&view) {
                warn!(
                    time = self.time,
                    invariant = invariant.name(),
                    severity = %invariant.severity(),
                    %violation,
                    "invariant violated"
                );
                self.violations.push(RecordedViolation {
                    time: self.time,
                    invariant: invariant.name().to_string(),
                    severity: invariant.severity(),
                    violation,
                });
            }
        }
    }
}
