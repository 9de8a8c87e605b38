//! Messages carried by channels

use crate::Address;
use serde::{Deserialize, Serialize};

/// A message with an open payload type
///
/// `reply_to` is optional correlation addressing; the engine never reads it
/// beyond copying it into the delivery [`crate::Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message<P> {
    pub from: Address,
    pub to: Address,
    pub payload: P,
    pub reply_to: Option<Address>,
}

impl<P> Message<P> {
    pub fn new(from: Address, to: Address, payload: P) -> Self {
        Self {
            from,
            to,
            payload,
            reply_to: None,
        }
    }

    pub fn with_reply_to(mut self, reply_to: Address) -> Self {
        self.reply_to = Some(reply_to);
        self
    }
}
