//! Composición de los dos pipelines sobre el mismo runner.

use std::sync::Arc;

use hc_core::Step;

use crate::communicator::Provisioner;
use crate::config::BuilderKind;
use crate::state::BuildState;
use crate::steps::{StepAllocateIp, StepBootInstance, StepBuildInstance, StepConfigurePublicKey, StepConfigureVnc,
                   StepConnect, StepCreateDisk, StepDisableCdBoot, StepHttpServer, StepPrepareBootMedia,
                   StepProvision, StepResolveRegion, StepShutdown, StepTeardown, StepTypeBootCommand};

pub type Pipeline = Vec<Box<dyn Step<BuildState>>>;

/// Template -> disco clonado -> instancia con clave SSH -> aprovisionar.
pub fn clone_steps(provisioner: Arc<dyn Provisioner>) -> Pipeline {
    vec![Box::new(StepResolveRegion),
         Box::new(StepCreateDisk::from_template()),
         Box::new(StepAllocateIp::new()),
         Box::new(StepBuildInstance::boot_from_disk()),
         Box::new(StepConfigurePublicKey),
         Box::new(StepBootInstance),
         Box::new(StepConnect),
         Box::new(StepProvision::new(provisioner)),
         Box::new(StepShutdown::clone_mode()),
         Box::new(StepTeardown)]
}

/// Boot media -> disco en blanco -> instalar tipeando por VNC -> aprovisionar.
pub fn vnc_steps(provisioner: Arc<dyn Provisioner>) -> Pipeline {
    vec![Box::new(StepResolveRegion),
         Box::new(StepHttpServer::new()),
         Box::new(StepPrepareBootMedia::new()),
         Box::new(StepCreateDisk::blank()),
         Box::new(StepAllocateIp::with_network_vars()),
         Box::new(StepBuildInstance::boot_from_cdrom()),
         Box::new(StepBootInstance),
         Box::new(StepConfigureVnc::new()),
         Box::new(StepTypeBootCommand),
         Box::new(StepDisableCdBoot),
         Box::new(StepConnect),
         Box::new(StepProvision::new(provisioner)),
         Box::new(StepShutdown::command_mode()),
         Box::new(StepTeardown)]
}

pub fn steps_for(kind: BuilderKind, provisioner: Arc<dyn Provisioner>) -> Pipeline {
    match kind {
        BuilderKind::Clone => clone_steps(provisioner),
        BuilderKind::Vnc => vnc_steps(provisioner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communicator::NoopProvisioner;

    fn ids(p: &Pipeline) -> Vec<&str> {
        p.iter().map(|s| s.id()).collect()
    }

    #[test]
    fn clone_pipeline_order() {
        let p = clone_steps(Arc::new(NoopProvisioner));
        assert_eq!(ids(&p),
                   vec!["resolve_region",
                        "create_disk_from_template",
                        "allocate_ip",
                        "build_instance",
                        "configure_public_key",
                        "boot_instance",
                        "connect",
                        "provision",
                        "shutdown",
                        "teardown"]);
    }

    #[test]
    fn vnc_pipeline_types_before_disabling_cd_boot() {
        let p = vnc_steps(Arc::new(NoopProvisioner));
        let ids = ids(&p);
        let pos = |id: &str| ids.iter().position(|s| *s == id).expect("step presente");
        assert!(pos("prepare_boot_media") < pos("create_blank_disk"));
        assert!(pos("boot_instance") < pos("configure_vnc"));
        assert!(pos("type_boot_command") < pos("disable_cd_boot"));
        assert_eq!(ids.last(), Some(&"teardown"));
    }
}
