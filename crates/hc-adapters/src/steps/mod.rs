//! Steps concretos de los dos pipelines.
//!
//! Cada step hace su trabajo en un `execute` que devuelve `Result`; `finish`
//! traduce un `Err` a la ranura `error` del estado más `Halt`. Los cleanups
//! son best-effort: reportan por `Ui::warn` y nunca reemplazan el error
//! principal.

pub mod allocate_ip;
pub mod boot_instance;
pub mod build_instance;
pub mod configure_public_key;
pub mod configure_vnc;
pub mod connect;
pub mod create_disk;
pub mod disable_cd_boot;
pub mod http_server;
pub mod prepare_boot_media;
pub mod provision;
pub mod resolve_region;
pub mod shutdown;
pub mod teardown;
pub mod type_boot_command;

use hc_core::{StepAction, StepState};

pub use allocate_ip::StepAllocateIp;
pub use boot_instance::StepBootInstance;
pub use build_instance::StepBuildInstance;
pub use configure_public_key::StepConfigurePublicKey;
pub use configure_vnc::StepConfigureVnc;
pub use connect::StepConnect;
pub use create_disk::StepCreateDisk;
pub use disable_cd_boot::StepDisableCdBoot;
pub use http_server::StepHttpServer;
pub use prepare_boot_media::StepPrepareBootMedia;
pub use provision::StepProvision;
pub use resolve_region::StepResolveRegion;
pub use shutdown::StepShutdown;
pub use teardown::StepTeardown;
pub use type_boot_command::StepTypeBootCommand;

use crate::error::BuildError;
use crate::state::BuildState;

pub(crate) fn finish(state: &mut BuildState, result: Result<(), BuildError>) -> StepAction {
    match result {
        Ok(()) => StepAction::Continue,
        Err(err) => {
            state.fail(err);
            StepAction::Halt
        }
    }
}

/// `true` si la corrida no terminó limpia y el cleanup debe liberar lo que
/// el step creó.
pub(crate) fn run_failed(state: &BuildState) -> bool {
    state.signals().is_failed()
}
