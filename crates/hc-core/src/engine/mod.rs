//! Engine module: runner secuencial, builder y unwind en orden inverso.

pub mod builder;
pub mod core;

pub use self::core::FlowRunner;
pub use builder::RunnerBuilder;

pub use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use crate::step::{RunStatus, Step, StepAction};
