//! Apagado del guest antes del teardown.
//!
//! - clone: con `shutdown_from_api` se apaga desde la API; si no, se espera
//!   (cadencia de 10s, hasta `shutdown_timeout`) a que el guest se apague
//!   solo.
//! - vnc: corre `shutdown_command` por el communicator y da
//!   `shutdown_timeout` de gracia; si vence, apaga desde la API. Sin
//!   comando, apaga desde la API directamente.

use hc_core::{Step, StepAction};
use hc_domain::InstanceState;

use super::finish;
use crate::communicator::RemoteCmd;
use crate::error::BuildError;
use crate::state::{BuildState, StateKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    Clone,
    Command,
}

pub struct StepShutdown {
    mode: ShutdownMode,
}

impl StepShutdown {
    pub fn clone_mode() -> Self {
        Self { mode: ShutdownMode::Clone }
    }

    pub fn command_mode() -> Self {
        Self { mode: ShutdownMode::Command }
    }

    fn execute(&self, state: &mut BuildState) -> Result<(), BuildError> {
        let id = state.instance_ref()?.id.clone();
        match self.mode {
            ShutdownMode::Clone => Self::clone_shutdown(state, &id),
            ShutdownMode::Command => Self::command_shutdown(state, &id),
        }
    }

    fn clone_shutdown(state: &mut BuildState, id: &str) -> Result<(), BuildError> {
        if state.client.instance_state(id)? != InstanceState::Running {
            return Ok(());
        }
        if state.config.shutdown_from_api {
            state.ui.say("Stopping instance via the API");
            state.client.instance_stop(id, state.config.shutdown_timeout())?;
        } else {
            state.ui.say("Waiting for the instance to shut down");
            state.client.instance_wait_for_state(id, InstanceState::Stopped, state.config.shutdown_poll())?;
        }
        Ok(())
    }

    fn command_shutdown(state: &mut BuildState, id: &str) -> Result<(), BuildError> {
        let command = state.config.shutdown_command.clone();
        if command.trim().is_empty() {
            state.ui.say("No shutdown_command, stopping instance via the API");
            state.client.instance_stop(id, state.config.wait_timeout())?;
            return Ok(());
        }

        state.ui.say("Gracefully halting instance...");
        let ui = state.ui.clone();
        let comm = state.communicator_mut()?;
        // el comando suele cortar la sesión: el exit status no es confiable
        match comm.run(&RemoteCmd::new(command.as_str())) {
            Ok(out) if !out.success() => ui.say(&format!("shutdown command exited with status {}", out.exit_status)),
            Ok(_) => {}
            Err(e) => return Err(BuildError::Communicator(format!("error sending shutdown command: {e}"))),
        }

        let grace = state.config.state_poll().with_timeout(state.config.shutdown_timeout());
        match state.client.instance_wait_for_state(id, InstanceState::Stopped, grace) {
            Ok(()) => Ok(()),
            Err(hc_api::ApiError::Timeout { .. }) => {
                state.ui.warn("Grace period elapsed, stopping instance via the API");
                state.client.instance_stop(id, state.config.wait_timeout())?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Step<BuildState> for StepShutdown {
    fn id(&self) -> &str {
        "shutdown"
    }

    fn requires(&self) -> Vec<StateKey> {
        vec![StateKey::Instance]
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        if result.is_ok() {
            state.ui.say("Instance stopped");
        }
        finish(state, result)
    }
}
