//! The actor contract
//!
//! A [`Process`] owns private state and, when polled, returns the [`Step`]s
//! it is currently willing to run. Every guard (local predicates as well as
//! [`crate::Channel::can_send`] / [`crate::Channel::can_recv`]) is evaluated
//! inside [`Process::ready`]; a step that has been handed out must be
//! executable without further checks.

use crate::world::{StepContext, WorldView};
use crate::ActorId;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;

/// An actor participating in a simulation
///
/// `ready` receives shared access only. All mutation happens inside the
/// returned steps, which get exclusive access to this process and to the
/// world's channels for the duration of one tick.
pub trait Process<P>: Sized + 'static {
    /// Stable identity, unique within one world
    fn id(&self) -> &ActorId;

    /// Steps enabled in the current world state
    ///
    /// Must be empty if and only if the process has nothing it can do.
    /// Several steps may be returned when independent guards hold at once.
    fn ready(&self, world: &WorldView<'_, P>) -> Vec<Step<Self, P>>;
}

type Action<A, P> = Box<dyn FnOnce(&mut A, &mut StepContext<'_, P>)>;

/// One atomic transition of process `A`
pub struct Step<A, P> {
    label: Cow<'static, str>,
    action: Action<A, P>,
}

impl<A, P> Step<A, P> {
    pub fn new<F>(label: impl Into<Cow<'static, str>>, action: F) -> Self
    where
        F: FnOnce(&mut A, &mut StepContext<'_, P>) + 'static,
    {
        Self {
            label: label.into(),
            action: Box::new(action),
        }
    }

    /// Short name used in logs
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<A, P> fmt::Debug for Step<A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Type-erased process storage inside a world
///
/// Steps returned by the last `poll` are kept until `clear` so that the
/// scheduler can address them by index.
pub(crate) trait Slot<P> {
    fn poll(&mut self, world: &WorldView<'_, P>) -> usize;
    fn fire(&mut self, index: usize, ctx: &mut StepContext<'_, P>) -> Cow<'static, str>;
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
}

pub(crate) struct ProcessSlot<A, P> {
    process: A,
    pending: Vec<Step<A, P>>,
}

impl<A, P> ProcessSlot<A, P> {
    pub(crate) fn new(process: A) -> Self {
        Self {
            process,
            pending: Vec::new(),
        }
    }
}

impl<A: Process<P>, P> Slot<P> for ProcessSlot<A, P> {
    fn poll(&mut self, world: &WorldView<'_, P>) -> usize {
        self.pending = self.process.ready(world);
        self.pending.len()
    }

    fn fire(&mut self, index: usize, ctx: &mut StepContext<'_, P>) -> Cow<'static, str> {
        let Step { label, action } = self.pending.swap_remove(index);
        action(&mut self.process, ctx);
        label
    }

    fn clear(&mut self) {
        self.pending.clear();
    }

    fn as_any(&self) -> &dyn Any {
        &self.process
    }
}
