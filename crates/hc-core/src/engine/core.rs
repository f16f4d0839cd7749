//! Core FlowRunner implementation

use log::{debug, info, warn};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::engine::RunnerBuilder;
use crate::errors::CoreEngineError;
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::state::StepState;
use crate::step::{RunStatus, Step, StepAction};

/// Motor de ejecución secuencial de steps.
///
/// Ejecuta los steps en orden; se detiene ante `Halt`, prerequisito faltante
/// o cancelación. Luego (sin importar por qué se detuvo) invoca `cleanup` en
/// orden inverso sobre cada step que arrancó, de modo que los recursos se
/// liberan en el orden opuesto al que se crearon.
pub struct FlowRunner<S: StepState, E: EventStore = InMemoryEventStore> {
    steps: Vec<Box<dyn Step<S>>>,
    event_store: E,
    cancel: CancelToken,
    run_id: Uuid,
    status: RunStatus,
}

impl<S: StepState> FlowRunner<S, InMemoryEventStore> {
    /// Crea un builder con store de eventos en memoria.
    #[inline]
    pub fn builder() -> RunnerBuilder<S, InMemoryEventStore> {
        RunnerBuilder::new(InMemoryEventStore::default())
    }
}

impl<S: StepState, E: EventStore> FlowRunner<S, E> {
    /// Builder con una store provista por el llamador.
    pub fn builder_with_store(event_store: E) -> RunnerBuilder<S, E> {
        RunnerBuilder::new(event_store)
    }

    pub fn new_with_store(event_store: E, steps: Vec<Box<dyn Step<S>>>, cancel: CancelToken) -> Self {
        Self { steps,
               event_store,
               cancel,
               run_id: Uuid::new_v4(),
               status: RunStatus::Pending }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    /// Handle para cancelar desde otro hilo mientras `run` bloquea.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Ejecuta el pipeline completo sobre `state` y devuelve el estado
    /// terminal. El error del build (si lo hubo) queda en
    /// `state.signals().error()`.
    pub fn run(&mut self, state: &mut S) -> Result<RunStatus, CoreEngineError> {
        if self.status != RunStatus::Pending {
            return Err(CoreEngineError::AlreadyRun);
        }
        self.status = RunStatus::Running;
        self.event_store
            .append_kind(self.run_id, RunEventKind::RunInitialized { step_count: self.steps.len() });

        let mut started = 0usize;
        for (index, step) in self.steps.iter_mut().enumerate() {
            if self.cancel.is_cancelled() {
                state.signals_mut().mark_cancelled();
                self.event_store
                    .append_kind(self.run_id, RunEventKind::RunCancelled { step_index: index });
                break;
            }

            let missing = step.requires().into_iter().find(|k| !state.contains(*k));
            if let Some(key) = missing {
                let err = CoreEngineError::MissingState { step: step.id().to_string(),
                                                          key: key.to_string() };
                warn!("halting before step '{}': {err}", step.id());
                self.event_store.append_kind(self.run_id,
                                             RunEventKind::StepHalted { step_index: index,
                                                                        step_id: step.id().to_string(),
                                                                        reason: Some(err.to_string()) });
                state.signals_mut().fail(err.into());
                state.signals_mut().mark_halted();
                break;
            }

            info!("running step '{}'", step.id());
            self.event_store.append_kind(self.run_id,
                                         RunEventKind::StepStarted { step_index: index,
                                                                     step_id: step.id().to_string() });
            started = index + 1;

            match step.run(state) {
                StepAction::Continue => {
                    self.event_store.append_kind(self.run_id,
                                                 RunEventKind::StepFinished { step_index: index,
                                                                              step_id: step.id().to_string() });
                }
                StepAction::Halt => {
                    debug!("step '{}' requested halt", step.id());
                    state.signals_mut().mark_halted();
                    self.event_store.append_kind(self.run_id,
                                                 RunEventKind::StepHalted { step_index: index,
                                                                            step_id: step.id().to_string(),
                                                                            reason: None });
                    break;
                }
            }

            if self.cancel.is_cancelled() {
                state.signals_mut().mark_cancelled();
                self.event_store
                    .append_kind(self.run_id, RunEventKind::RunCancelled { step_index: index });
                break;
            }
        }

        for index in (0..started).rev() {
            let step = &mut self.steps[index];
            debug!("cleanup of step '{}'", step.id());
            self.event_store.append_kind(self.run_id,
                                         RunEventKind::CleanupInvoked { step_index: index,
                                                                        step_id: step.id().to_string() });
            step.cleanup(state);
        }

        let signals = state.signals();
        self.status = if signals.is_cancelled() {
            RunStatus::Cancelled
        } else if signals.is_halted() {
            RunStatus::Halted
        } else {
            RunStatus::Completed
        };
        self.event_store
            .append_kind(self.run_id, RunEventKind::RunCompleted { status: self.status });
        Ok(self.status)
    }

    /// Eventos de la corrida.
    pub fn events(&self) -> Vec<RunEvent> {
        self.event_store.list(self.run_id)
    }

    /// Variante compacta de eventos, útil en tests.
    pub fn event_variants(&self) -> Vec<&'static str> {
        self.events()
            .iter()
            .map(|e| match e.kind {
                RunEventKind::RunInitialized { .. } => "I",
                RunEventKind::StepStarted { .. } => "S",
                RunEventKind::StepFinished { .. } => "F",
                RunEventKind::StepHalted { .. } => "H",
                RunEventKind::RunCancelled { .. } => "X",
                RunEventKind::CleanupInvoked { .. } => "U",
                RunEventKind::RunCompleted { .. } => "C",
            })
            .collect()
    }

    /// Ids de los steps cuyo cleanup se invocó, en el orden en que ocurrió.
    pub fn cleanup_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e.kind {
                RunEventKind::CleanupInvoked { step_id, .. } => Some(step_id),
                _ => None,
            })
            .collect()
    }
}
