//! Bounded FIFO channels
//!
//! A channel is owned by exactly one actor, the only one allowed to dequeue
//! from it. The buffer is mutated only by [`Channel::try_send`] and
//! [`Channel::try_recv`], both of which check admission first, so
//! `0 <= len <= capacity` holds unconditionally.
//!
//! Messages queued before a world is built carry enqueue tick 0; only the
//! running world stamps later ticks, so an enqueue tick never lies in the
//! future of the world clock.

use crate::{ActorId, Address, Message, Tick};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::warn;

/// Dense handle for a channel within one world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub(crate) usize);

impl ChannelId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A queued message together with the tick it was enqueued at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<P> {
    pub message: Message<P>,
    pub enqueued_at: Tick,
}

/// Rejected send; hands the message back untouched
#[derive(Clone, PartialEq, Eq)]
pub struct SendError<P> {
    pub message: Message<P>,
    pub capacity: usize,
}

impl<P> fmt::Debug for SendError<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendError")
            .field("to", &self.message.to)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<P> fmt::Display for SendError<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channel {} is full (capacity {})",
            self.message.to, self.capacity
        )
    }
}

impl<P> std::error::Error for SendError<P> {}

/// Bounded FIFO message queue
#[derive(Debug, Clone)]
pub struct Channel<P> {
    address: Address,
    capacity: usize,
    buffer: VecDeque<Envelope<P>>,
}

impl<P> Channel<P> {
    /// Create a channel owned by `owner`
    ///
    /// Rendezvous (zero-capacity) channels are not supported; a capacity of
    /// 0 is promoted to 1.
    pub fn new(owner: impl Into<ActorId>, name: impl Into<String>, capacity: usize) -> Self {
        let address = Address::new(owner, name);
        let capacity = if capacity == 0 {
            warn!(%address, "rendezvous channels are unsupported, promoting capacity 0 to 1");
            1
        } else {
            capacity
        };

        Self {
            address,
            capacity,
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner(&self) -> &ActorId {
        &self.address.actor
    }

    pub fn name(&self) -> &str {
        &self.address.channel
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn can_send(&self) -> bool {
        self.buffer.len() < self.capacity
    }

    pub fn can_recv(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Oldest queued message, if any
    pub fn peek(&self) -> Option<&Message<P>> {
        self.buffer.front().map(|e| &e.message)
    }

    /// Append `message` if there is room; otherwise return it without mutation
    ///
    /// Used to seed a channel before the world starts, so the message is
    /// stamped with tick 0.
    pub fn try_send(&mut self, message: Message<P>) -> Result<(), SendError<P>> {
        self.enqueue(message, 0)
    }

    pub(crate) fn enqueue(&mut self, message: Message<P>, now: Tick) -> Result<(), SendError<P>> {
        if !self.can_send() {
            return Err(SendError {
                message,
                capacity: self.capacity,
            });
        }
        self.buffer.push_back(Envelope {
            message,
            enqueued_at: now,
        });
        Ok(())
    }

    /// Pop the oldest message if there is one
    pub fn try_recv(&mut self) -> Option<Envelope<P>> {
        self.buffer.pop_front()
    }
}

/// Name table from [`Address`] to [`ChannelId`], built once per world
#[derive(Debug, Default)]
pub struct ChannelIndex {
    ids: HashMap<Address, ChannelId>,
}

impl ChannelIndex {
    pub fn get(&self, address: &Address) -> Option<ChannelId> {
        self.ids.get(address).copied()
    }
}

/// Something that names a channel: an [`Address`] or a resolved [`ChannelId`]
///
/// Resolving an address that is not registered is a wiring mistake in the
/// model and panics.
pub trait ChannelKey {
    fn resolve(&self, index: &ChannelIndex) -> ChannelId;
}

impl ChannelKey for Address {
    fn resolve(&self, index: &ChannelIndex) -> ChannelId {
        match index.get(self) {
            Some(id) => id,
            None => panic!("unknown channel address {}", self),
        }
    }
}

impl ChannelKey for ChannelId {
    fn resolve(&self, _index: &ChannelIndex) -> ChannelId {
        *self
    }
}

impl<K: ChannelKey + ?Sized> ChannelKey for &K {
    fn resolve(&self, index: &ChannelIndex) -> ChannelId {
        (**self).resolve(index)
    }
}

/// Channels of one world in registration order
#[derive(Debug)]
pub(crate) struct ChannelTable<P> {
    channels: Vec<Channel<P>>,
    index: ChannelIndex,
}

impl<P> ChannelTable<P> {
    pub(crate) fn new() -> Self {
        Self {
            channels: Vec::new(),
            index: ChannelIndex::default(),
        }
    }

    /// Register a channel, handing it back if its address is taken
    pub(crate) fn insert(&mut self, channel: Channel<P>) -> Result<ChannelId, Channel<P>> {
        if self.index.ids.contains_key(channel.address()) {
            return Err(channel);
        }
        let id = ChannelId(self.channels.len());
        self.index.ids.insert(channel.address().clone(), id);
        self.channels.push(channel);
        Ok(id)
    }

    pub(crate) fn index(&self) -> &ChannelIndex {
        &self.index
    }

    pub(crate) fn get(&self, key: impl ChannelKey) -> &Channel<P> {
        let id = key.resolve(&self.index);
        &self.channels[id.0]
    }

    pub(crate) fn get_mut(&mut self, key: impl ChannelKey) -> &mut Channel<P> {
        let id = key.resolve(&self.index);
        &mut self.channels[id.0]
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, Channel<P>> {
        self.channels.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.channels.len()
    }
}
