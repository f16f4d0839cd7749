//! Disco destino del build: clonado del template más nuevo (clone) o en
//! blanco (vnc). Se nombra `<prefix> in-progress: <build>` hasta que el
//! builder lo renombra al terminar.

use hc_api::CreateDiskRequest;
use hc_core::{Step, StepAction};
use hc_domain::Template;

use super::{finish, run_failed};
use crate::error::BuildError;
use crate::state::{BuildState, StateKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskSource {
    Template,
    Blank,
}

pub struct StepCreateDisk {
    source: DiskSource,
}

impl StepCreateDisk {
    pub fn from_template() -> Self {
        Self { source: DiskSource::Template }
    }

    pub fn blank() -> Self {
        Self { source: DiskSource::Blank }
    }

    fn execute(&self, state: &mut BuildState) -> Result<(), BuildError> {
        let cfg = &state.config;
        let region_id = state.region_ref()?.id.clone();
        let name = format!("{} in-progress: {}", cfg.name_prefix, cfg.build_name);
        let mut request = CreateDiskRequest::blank(name.as_str(),
                                                   cfg.disk_size,
                                                   region_id.as_str(),
                                                   cfg.disk_performance_tier_id.as_str());

        if self.source == DiskSource::Template {
            let templates = state.client.template_list()?;
            let template = Template::select_newest(&templates,
                                                   &region_id,
                                                   &cfg.template_id,
                                                   &cfg.template_slug,
                                                   &cfg.template_name)
                           .ok_or_else(|| {
                               BuildError::precondition(format!("could not find template: {}{}{} in region {region_id}",
                                                                cfg.template_id, cfg.template_slug, cfg.template_name))
                           })?;
            state.ui.say(&format!("Creating boot disk from template {} (version {})", template.name, template.version));
            request = request.from_template(template.id.as_str());
        } else {
            state.ui.say(&format!("Creating blank target disk with name {name}"));
        }

        let disk = state.client.disk_create(&request)?;
        state.ui.say(&format!("Disk created with id: {}", disk.id));
        state.disk = Some(disk);
        Ok(())
    }
}

impl Step<BuildState> for StepCreateDisk {
    fn id(&self) -> &str {
        match self.source {
            DiskSource::Template => "create_disk_from_template",
            DiskSource::Blank => "create_blank_disk",
        }
    }

    fn requires(&self) -> Vec<StateKey> {
        vec![StateKey::Region]
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }

    /// En éxito el disco es el artifact; sólo se borra si el build falló.
    fn cleanup(&mut self, state: &mut BuildState) {
        if !run_failed(state) {
            return;
        }
        if let Some(disk) = state.disk.take() {
            state.ui.say(&format!("Deleting disk {}", disk.id));
            if let Err(e) = state.client.disk_delete(&disk.id) {
                state.ui.warn(&format!("error deleting disk {}: {e}", disk.id));
            }
        }
    }
}
