//! Reference models
//!
//! Small systems with known answers: a Kripke graph of a bounded buffer for
//! the checker, and two actor worlds for the scheduler.

pub mod bounded_buffer;
pub mod counter;
pub mod producer_consumer;
