//! Arma la instancia con los discos y la IP del build.

use hc_api::CreateInstanceRequest;
use hc_core::{Step, StepAction};
use hc_domain::BootDevice;

use super::teardown::release_instance;
use super::{finish, run_failed};
use crate::error::BuildError;
use crate::state::{BuildState, StateKey};

pub struct StepBuildInstance {
    boot_device: BootDevice,
}

impl StepBuildInstance {
    /// Arranca del disco clonado.
    pub fn boot_from_disk() -> Self {
        Self { boot_device: BootDevice::Disk }
    }

    /// Disco destino + boot media, arrancando del cdrom.
    pub fn boot_from_cdrom() -> Self {
        Self { boot_device: BootDevice::Cdrom }
    }

    fn execute(&self, state: &mut BuildState) -> Result<(), BuildError> {
        let cfg = &state.config;
        let mut request = CreateInstanceRequest::new(cfg.resource_name(&cfg.vm_name),
                                                     cfg.memory,
                                                     cfg.instance_performance_tier_id.as_str(),
                                                     state.region_ref()?.id.as_str(),
                                                     self.boot_device).disk(state.disk_ref()?.id.as_str());
        if self.boot_device == BootDevice::Cdrom {
            request = request.disk(state.boot_disk_ref()?.id.as_str());
        }
        request = request.ip(state.ip_ref()?.id.as_str());

        state.ui.say("Creating instance...");
        let instance = state.client.instance_create(&request)?;
        state.ui.say(&format!("Instance created with ID: {}", instance.id));
        state.instance = Some(instance);
        Ok(())
    }
}

impl Step<BuildState> for StepBuildInstance {
    fn id(&self) -> &str {
        "build_instance"
    }

    fn requires(&self) -> Vec<StateKey> {
        let mut keys = vec![StateKey::Region, StateKey::Disk, StateKey::Ip];
        if self.boot_device == BootDevice::Cdrom {
            keys.push(StateKey::BootDisk);
        }
        keys
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }

    fn cleanup(&mut self, state: &mut BuildState) {
        if run_failed(state) {
            release_instance(state);
        }
    }
}
