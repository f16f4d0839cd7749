//! Conecta el communicator a la IP del build. El guest puede tardar en
//! levantar SSH: los errores de conexión se reintentan a la cadencia de
//! estados hasta `ssh_timeout`.

use hc_core::{wait_for_condition, PollConfig, Step, StepAction};
use log::debug;

use super::finish;
use crate::error::BuildError;
use crate::state::{BuildState, StateKey};

pub struct StepConnect;

impl StepConnect {
    fn execute(&self, state: &mut BuildState) -> Result<(), BuildError> {
        let host = state.ip_ref()?.address.clone();
        let target = state.ssh_target(&host);
        let poll = PollConfig::new(state.config.state_poll().interval, state.config.ssh_timeout());
        let factory = state.communicators.clone();

        state.ui.say(&format!("Waiting for SSH on {host}:{}", target.port));
        let comm = wait_for_condition(poll, &format!("ssh on {host}"), "reachable", || {
                       match factory.connect(&target) {
                           Ok(comm) => Ok::<_, BuildError>(Some(comm)),
                           Err(e) => {
                               debug!("ssh to {host} not ready: {e}");
                               Ok(None)
                           }
                       }
                   })?;
        state.ui.say("Connected to SSH!");
        state.communicator = Some(comm);
        Ok(())
    }
}

impl Step<BuildState> for StepConnect {
    fn id(&self) -> &str {
        "connect"
    }

    fn requires(&self) -> Vec<StateKey> {
        vec![StateKey::Instance, StateKey::Ip]
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }

    fn cleanup(&mut self, state: &mut BuildState) {
        state.communicator = None;
    }
}
