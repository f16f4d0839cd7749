//! Builder para `FlowRunner`.
//!
//! Acumula la lista ordenada de steps, la store de eventos y el token de
//! cancelación del host.
//!
//! ```ignore
//! let mut runner = FlowRunner::builder()
//!     .add_step(StepResolveRegion)
//!     .add_step(StepCreateDisk::from_template())
//!     .cancel_token(token)
//!     .build();
//! ```

use crate::cancel::CancelToken;
use crate::engine::FlowRunner;
use crate::event::EventStore;
use crate::state::StepState;
use crate::step::Step;

pub struct RunnerBuilder<S: StepState, E: EventStore> {
    event_store: E,
    steps: Vec<Box<dyn Step<S>>>,
    cancel: CancelToken,
}

impl<S: StepState, E: EventStore> RunnerBuilder<S, E> {
    pub(crate) fn new(event_store: E) -> Self {
        Self { event_store,
               steps: Vec::new(),
               cancel: CancelToken::new() }
    }

    /// Añade el siguiente paso del pipeline.
    #[inline]
    pub fn add_step<T>(mut self, step: T) -> Self
        where T: Step<S> + 'static
    {
        self.steps.push(Box::new(step));
        self
    }

    /// Añade una lista ya armada (p.ej. un pipeline predefinido).
    pub fn steps(mut self, steps: Vec<Box<dyn Step<S>>>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Token que el host usa para cancelar la corrida.
    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn build(self) -> FlowRunner<S, E> {
        FlowRunner::new_with_store(self.event_store, self.steps, self.cancel)
    }
}
