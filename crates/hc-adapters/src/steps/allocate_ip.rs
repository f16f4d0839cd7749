//! Reserva una IP en `network_id`. En el pipeline vnc además publica
//! máscara, CIDR y gateway de la red para el boot command, que configura la
//! red estática del instalador.

use hc_core::{Step, StepAction};

use super::{finish, run_failed};
use super::teardown::release_ip;
use crate::error::BuildError;
use crate::state::BuildState;

pub struct StepAllocateIp {
    record_network: bool,
}

impl StepAllocateIp {
    pub fn new() -> Self {
        Self { record_network: false }
    }

    /// También guarda la red y sus variables `HYPERCLOUD_*`.
    pub fn with_network_vars() -> Self {
        Self { record_network: true }
    }

    fn execute(&self, state: &mut BuildState) -> Result<(), BuildError> {
        let network_id = state.config.network_id.clone();
        let name = state.config.resource_name(&state.config.vm_name);

        state.ui.say("Allocating IP address");
        let ip = state.client.ip_allocate(&network_id, Some(&name))?;
        state.ui.say(&format!("Allocated ip {}", ip.address));
        state.set_var("HYPERCLOUD_IP", ip.address.clone());
        state.ip = Some(ip);

        if self.record_network {
            let network = state.client.network_show(&network_id)?;
            let cidr = network.cidr()
                              .map_err(|e| BuildError::precondition(format!("network {network_id}: {e}")))?
                              .to_string();
            state.set_var("HYPERCLOUD_NETMASK", network.netmask.clone());
            state.set_var("HYPERCLOUD_CIDR", cidr);
            state.set_var("HYPERCLOUD_GATEWAY", network.gateway.clone());
            state.network = Some(network);
        }
        Ok(())
    }
}

impl Default for StepAllocateIp {
    fn default() -> Self {
        Self::new()
    }
}

impl Step<BuildState> for StepAllocateIp {
    fn id(&self) -> &str {
        "allocate_ip"
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }

    /// El teardown la libera en éxito; acá sólo si sigue tomada.
    fn cleanup(&mut self, state: &mut BuildState) {
        if run_failed(state) {
            release_ip(state);
        }
    }
}
