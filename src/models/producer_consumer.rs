//! One producer, one consumer, one bounded channel
//!
//! The producer emits `limit` sequence numbers into `consumer/inbox`; the
//! consumer drains the inbox whenever it holds something.

use ripple_sim::{
    ActorId, Address, Channel, Message, Process, SimulationConfig, Step, StepContext, World,
    WorldBuilder, WorldError, WorldView,
};

pub const PRODUCER: &str = "producer";
pub const CONSUMER: &str = "consumer";
pub const INBOX: &str = "inbox";

pub fn inbox() -> Address {
    Address::new(CONSUMER, INBOX)
}

#[derive(Debug, Clone)]
pub struct Producer {
    id: ActorId,
    target: Address,
    limit: u32,
    sent: u32,
}

impl Producer {
    pub fn new(target: Address, limit: u32) -> Self {
        Self {
            id: ActorId::new(PRODUCER),
            target,
            limit,
            sent: 0,
        }
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }
}

impl Process<u32> for Producer {
    fn id(&self) -> &ActorId {
        &self.id
    }

    fn ready(&self, world: &WorldView<'_, u32>) -> Vec<Step<Self, u32>> {
        if self.sent >= self.limit || !world.can_send(&self.target) {
            return Vec::new();
        }
        vec![Step::new(
            "produce",
            |producer: &mut Producer, ctx: &mut StepContext<'_, u32>| {
                let message = Message::new(
                    Address::new(producer.id.clone(), "out"),
                    producer.target.clone(),
                    producer.sent,
                );
                if ctx.send(message).is_ok() {
                    producer.sent += 1;
                }
            },
        )]
    }
}

#[derive(Debug, Clone)]
pub struct Consumer {
    id: ActorId,
    inbox: Address,
    received: Vec<u32>,
}

impl Consumer {
    pub fn new() -> Self {
        Self {
            id: ActorId::new(CONSUMER),
            inbox: inbox(),
            received: Vec::new(),
        }
    }

    pub fn received(&self) -> &[u32] {
        &self.received
    }
}

impl Default for Consumer {
    fn default() -> Self {
        Self::new()
    }
}

impl Process<u32> for Consumer {
    fn id(&self) -> &ActorId {
        &self.id
    }

    fn ready(&self, world: &WorldView<'_, u32>) -> Vec<Step<Self, u32>> {
        if !world.can_recv(&self.inbox) {
            return Vec::new();
        }
        vec![Step::new(
            "consume",
            |consumer: &mut Consumer, ctx: &mut StepContext<'_, u32>| {
                if let Some(message) = ctx.recv(&consumer.inbox) {
                    consumer.received.push(message.payload);
                }
            },
        )]
    }
}

/// Producer sending `limit` messages through an inbox of `capacity`
pub fn world(
    config: SimulationConfig,
    limit: u32,
    capacity: usize,
) -> Result<World<u32>, WorldError> {
    WorldBuilder::new()
        .config(config)
        .channel(Channel::new(CONSUMER, INBOX, capacity))
        .process(Producer::new(inbox(), limit))
        .process(Consumer::new())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_enabled_without_limit() {
        let mut world = world(SimulationConfig::default().with_seed(1), 0, 1).unwrap();
        assert!(world.is_quiescent());
        assert!(!world.step_random());
        assert_eq!(world.time(), 0);
    }

    #[test]
    fn test_larger_inbox_buffers_messages() {
        let mut world = world(SimulationConfig::default().with_seed(8), 5, 5).unwrap();
        let outcome = world.run();
        assert!(outcome.quiescent);
        assert_eq!(outcome.steps, 10);

        let consumer = world.process::<Consumer>(CONSUMER).unwrap();
        assert_eq!(consumer.received(), &[0, 1, 2, 3, 4]);
    }
}
