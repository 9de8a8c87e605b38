//! Delivery log entries

use crate::{Address, Tick};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record of one message delivery
///
/// Appended by the world when a receiver dequeues a message. The log is
/// totally ordered by `time` and holds at most one entry per tick, since a
/// step may deliver only one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<P> {
    /// Tick during which the message was dequeued
    pub time: Tick,
    pub from: Address,
    pub to: Address,
    pub payload: P,
    pub reply_to: Option<Address>,
    /// Ticks between enqueue and dequeue
    pub queue_delay: Tick,
}

impl<P> Event<P> {
    /// Tick at which the message entered its channel
    pub fn enqueued_at(&self) -> Tick {
        self.time - self.queue_delay
    }
}

impl<P: fmt::Debug> fmt::Display for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[t={}] {} → {} {:?} (waited {})",
            self.time, self.from, self.to, self.payload, self.queue_delay
        )?;
        if let Some(reply_to) = &self.reply_to {
            write!(f, " reply-to {}", reply_to)?;
        }
        Ok(())
    }
}
