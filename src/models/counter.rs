//! Single actor with two independent guards
//!
//! `x < max` enables an increment and `x > 0` enables a decrement. Inside
//! the bounds both steps are offered in the same tick, so the scheduler
//! picks between them. The counter never quiesces; runs are bounded by the
//! step limit.

use ripple_sim::{
    ActorId, Process, SimulationConfig, Step, StepContext, World, WorldBuilder, WorldError,
    WorldView,
};

pub const COUNTER: &str = "counter";

#[derive(Debug, Clone)]
pub struct Counter {
    id: ActorId,
    value: i64,
    max: i64,
    increments: u64,
    decrements: u64,
}

impl Counter {
    pub fn new(start: i64, max: i64) -> Self {
        Self {
            id: ActorId::new(COUNTER),
            value: start,
            max,
            increments: 0,
            decrements: 0,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn increments(&self) -> u64 {
        self.increments
    }

    pub fn decrements(&self) -> u64 {
        self.decrements
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new(5, 20)
    }
}

impl<P: 'static> Process<P> for Counter {
    fn id(&self) -> &ActorId {
        &self.id
    }

    fn ready(&self, _world: &WorldView<'_, P>) -> Vec<Step<Self, P>> {
        let mut steps = Vec::with_capacity(2);
        if self.value < self.max {
            steps.push(Step::new(
                "increment",
                |counter: &mut Counter, _: &mut StepContext<'_, P>| {
                    counter.value += 1;
                    counter.increments += 1;
                },
            ));
        }
        if self.value > 0 {
            steps.push(Step::new(
                "decrement",
                |counter: &mut Counter, _: &mut StepContext<'_, P>| {
                    counter.value -= 1;
                    counter.decrements += 1;
                },
            ));
        }
        steps
    }
}

/// World holding a single default counter
pub fn world(config: SimulationConfig) -> Result<World<()>, WorldError> {
    WorldBuilder::new()
        .config(config)
        .process(Counter::default())
        .build()
}
