//! Una vez instalado el sistema, la instancia pasa a arrancar del disco.

use hc_core::{Step, StepAction};
use hc_domain::BootDevice;

use super::finish;
use crate::error::BuildError;
use crate::state::{BuildState, StateKey};

pub struct StepDisableCdBoot;

impl StepDisableCdBoot {
    fn execute(&self, state: &mut BuildState) -> Result<(), BuildError> {
        let id = state.instance_ref()?.id.clone();
        state.ui.say("Disabling boot from cdrom");
        let instance = state.client.instance_set_boot_device(&id, BootDevice::Disk)?;
        state.instance = Some(instance);
        Ok(())
    }
}

impl Step<BuildState> for StepDisableCdBoot {
    fn id(&self) -> &str {
        "disable_cd_boot"
    }

    fn requires(&self) -> Vec<StateKey> {
        vec![StateKey::Instance]
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }
}
