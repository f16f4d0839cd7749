//! hc-core: motor secuencial de steps para los builders de HyperCloud.
//!
//! Piezas:
//! - `poll`: primitiva poll-until-state (cadencia fija, sin backoff).
//! - `state`: contrato `StepState` + señales terminales (`RunSignals`).
//! - `step`: trait `Step` (run / cleanup) y `StepAction`.
//! - `engine`: `FlowRunner` + builder; ejecuta en orden y hace unwind en
//!   orden inverso.
//! - `event`: registro append-only de transiciones de una corrida.
pub mod cancel;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod poll;
pub mod state;
pub mod step;

pub use cancel::CancelToken;
pub use engine::{FlowRunner, RunnerBuilder};
pub use errors::CoreEngineError;
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use poll::{wait_for_condition, wait_for_state, PollConfig, PollError};
pub use state::{RunSignals, StepState};
pub use step::{RunStatus, Step, StepAction};

#[cfg(test)]
mod tests {
	use super::*;
	use std::fmt;

	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	enum Key {
		Token,
	}

	impl fmt::Display for Key {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "token")
		}
	}

	#[derive(Default)]
	struct Bag {
		token: Option<u32>,
		signals: RunSignals<CoreEngineError>,
	}

	impl StepState for Bag {
		type Key = Key;
		type Error = CoreEngineError;

		fn contains(&self, key: Key) -> bool {
			match key {
				Key::Token => self.token.is_some(),
			}
		}
		fn signals(&self) -> &RunSignals<CoreEngineError> { &self.signals }
		fn signals_mut(&mut self) -> &mut RunSignals<CoreEngineError> { &mut self.signals }
	}

	struct Produce;
	impl Step<Bag> for Produce {
		fn id(&self) -> &str { "produce" }
		fn run(&mut self, state: &mut Bag) -> StepAction {
			state.token = Some(7);
			StepAction::Continue
		}
	}

	struct Consume;
	impl Step<Bag> for Consume {
		fn id(&self) -> &str { "consume" }
		fn requires(&self) -> Vec<Key> { vec![Key::Token] }
		fn run(&mut self, state: &mut Bag) -> StepAction {
			state.token = state.token.map(|t| t * 2);
			StepAction::Continue
		}
	}

	#[test]
	fn runner_passes_state_between_steps() {
		let mut runner = FlowRunner::builder().add_step(Produce).add_step(Consume).build();
		let mut bag = Bag::default();
		let status = runner.run(&mut bag).expect("la corrida debería ejecutarse");
		assert_eq!(status, RunStatus::Completed);
		assert_eq!(bag.token, Some(14));
		assert_eq!(runner.event_variants(), vec!["I", "S", "F", "S", "F", "U", "U", "C"]);
	}

	#[test]
	fn missing_prerequisite_halts_before_run() {
		let mut runner = FlowRunner::builder().add_step(Consume).build();
		let mut bag = Bag::default();
		let status = runner.run(&mut bag).expect("la corrida debería ejecutarse");
		assert_eq!(status, RunStatus::Halted);
		assert!(matches!(bag.signals.error(), Some(CoreEngineError::MissingState { key, .. }) if key == "token"));
		// el step nunca arrancó: no hay cleanup
		assert_eq!(runner.event_variants(), vec!["I", "H", "C"]);
	}

	#[test]
	fn runner_cannot_be_reused() {
		let mut runner = FlowRunner::builder().add_step(Produce).build();
		let mut bag = Bag::default();
		runner.run(&mut bag).expect("primera corrida");
		assert_eq!(runner.run(&mut bag), Err(CoreEngineError::AlreadyRun));
	}
}
