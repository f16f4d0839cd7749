//! Teardown best-effort: desattacha discos, saca la red, libera la IP y
//! termina la instancia, en ese orden. Nada de esto es fatal: el artifact (el disco ya
//! desattachado) es durable, así que las fallas sólo se avisan.
//!
//! `release_instance` y `release_ip` también los usan los cleanups de los
//! steps que crearon esos recursos; cada uno limpia su campo del estado
//! cuando la liberación funcionó, así nada se libera dos veces.

use hc_core::{Step, StepAction};
use log::info;

use crate::state::BuildState;

pub(crate) fn release_instance(state: &mut BuildState) {
    let Some(instance) = state.instance.clone() else {
        return;
    };
    let client = state.client.clone();
    let ui = state.ui.clone();
    let id = instance.id.as_str();

    ui.say(&format!("Detaching disks from instance {id}"));
    if let Err(e) = client.instance_update_disks(id, &[]) {
        ui.warn(&format!("error detaching disks from instance {id}: {e}"));
    }
    ui.say(&format!("Removing network adapters from instance {id}"));
    if let Err(e) = client.instance_remove_networks(id) {
        ui.warn(&format!("error removing networks from instance {id}: {e}"));
    }
    release_ip(state);
    ui.say(&format!("Terminating instance {id}"));
    match client.instance_terminate(id, false, state.config.wait_timeout()) {
        Ok(()) => {
            info!("instance {id} terminated");
            state.instance = None;
        }
        Err(e) => ui.warn(&format!("error terminating instance {id}: {e}")),
    }
}

pub(crate) fn release_ip(state: &mut BuildState) {
    let Some(ip) = state.ip.clone() else {
        return;
    };
    state.ui.say(&format!("Deallocating ip {}", ip.address));
    match state.client.ip_deallocate(&ip.id) {
        Ok(()) => state.ip = None,
        Err(e) => state.ui.warn(&format!("error deallocating ip {}: {e}", ip.address)),
    }
}

pub struct StepTeardown;

impl Step<BuildState> for StepTeardown {
    fn id(&self) -> &str {
        "teardown"
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        release_instance(state);
        release_ip(state);
        StepAction::Continue
    }
}
