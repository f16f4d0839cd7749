//! Arranca la instancia y espera `running`.

use hc_core::{Step, StepAction};
use hc_domain::InstanceState;

use super::{finish, run_failed};
use crate::error::BuildError;
use crate::state::{BuildState, StateKey};

pub struct StepBootInstance;

impl StepBootInstance {
    fn execute(&self, state: &mut BuildState) -> Result<(), BuildError> {
        let id = state.instance_ref()?.id.clone();
        state.ui.say(&format!("Starting instance {id}"));
        state.client.instance_start(&id, state.config.wait_timeout())?;
        state.instance = Some(state.client.instance_show(&id)?);
        state.ui.say("Instance is running");
        Ok(())
    }
}

impl Step<BuildState> for StepBootInstance {
    fn id(&self) -> &str {
        "boot_instance"
    }

    fn requires(&self) -> Vec<StateKey> {
        vec![StateKey::Instance]
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }

    /// Si el build falló con la instancia encendida, la apaga para que el
    /// teardown pueda desattachar en frío.
    fn cleanup(&mut self, state: &mut BuildState) {
        if !run_failed(state) {
            return;
        }
        let Some(id) = state.instance.as_ref().map(|i| i.id.clone()) else {
            return;
        };
        match state.client.instance_state(&id) {
            Ok(InstanceState::Running) => {
                state.ui.say(&format!("Stopping instance {id}"));
                if let Err(e) = state.client.instance_stop(&id, state.config.wait_timeout()) {
                    state.ui.warn(&format!("error stopping instance {id}: {e}"));
                }
            }
            Ok(_) => {}
            Err(e) => state.ui.warn(&format!("error checking state of instance {id}: {e}")),
        }
    }
}
