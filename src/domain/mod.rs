//! Domain layer - entities, value objects, and the step state machine.

pub mod foundation;
pub mod plan;
