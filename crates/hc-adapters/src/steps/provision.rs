//! Entrega el communicator al provisioner del host.

use std::sync::Arc;

use hc_core::{Step, StepAction};

use super::finish;
use crate::communicator::Provisioner;
use crate::error::BuildError;
use crate::state::{BuildState, StateKey};

pub struct StepProvision {
    provisioner: Arc<dyn Provisioner>,
}

impl StepProvision {
    pub fn new(provisioner: Arc<dyn Provisioner>) -> Self {
        Self { provisioner }
    }

    fn execute(&self, state: &mut BuildState) -> Result<(), BuildError> {
        let ui = state.ui.clone();
        ui.say("Provisioning");
        let comm = state.communicator_mut()?;
        self.provisioner.provision(ui.as_ref(), comm)
    }
}

impl Step<BuildState> for StepProvision {
    fn id(&self) -> &str {
        "provision"
    }

    fn requires(&self) -> Vec<StateKey> {
        vec![StateKey::Communicator]
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }
}
