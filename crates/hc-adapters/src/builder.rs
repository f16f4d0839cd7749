//! Punto de entrada del host: valida la configuración y corre el pipeline.

use std::sync::Arc;

use chrono::Local;
use hc_api::{ApiConfig, HttpTransport, HyperCloudClient, UpdateDiskRequest};
use hc_core::{CancelToken, FlowRunner, RunStatus, StepState};
use log::{info, warn};

use crate::artifact::Artifact;
use crate::communicator::{CommunicatorFactory, Provisioner};
use crate::config::BuildConfig;
use crate::error::{BuildError, ConfigError};
use crate::pipeline::steps_for;
use crate::state::{ApiTransport, BuildState, Client};
use crate::ui::Ui;

/// Colaboradores que aporta el host para una corrida.
#[derive(Clone)]
pub struct BuildHost {
    pub ui: Arc<dyn Ui>,
    pub cancel: CancelToken,
    pub provisioner: Arc<dyn Provisioner>,
    pub communicators: Arc<dyn CommunicatorFactory>,
}

#[derive(Debug, Clone)]
pub struct Builder {
    config: BuildConfig,
    api: ApiConfig,
}

impl Builder {
    /// Valida y completa defaults. Todos los problemas juntos.
    pub fn prepare(mut config: BuildConfig) -> Result<Self, ConfigError> {
        let api = config.prepare()?;
        Ok(Self { config, api })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn api_config(&self) -> &ApiConfig {
        &self.api
    }

    /// Corre contra la API real (HTTP).
    pub fn run(&self, host: BuildHost) -> Result<Artifact, BuildError> {
        let transport = HttpTransport::new(&self.api)?;
        self.run_with_transport(Box::new(transport), host)
    }

    /// Corre con un transporte provisto (tests, API simulada).
    pub fn run_with_transport(&self, transport: Box<dyn ApiTransport>, host: BuildHost) -> Result<Artifact, BuildError> {
        let client: Arc<Client> = Arc::new(HyperCloudClient::new(transport).with_poll(self.config.state_poll()));
        let mut state = BuildState::new(self.config.clone(),
                                        client.clone(),
                                        host.ui.clone(),
                                        host.cancel.clone(),
                                        host.communicators.clone());

        let mut runner = FlowRunner::builder().steps(steps_for(self.config.kind, host.provisioner.clone()))
                                              .cancel_token(host.cancel.clone())
                                              .build();
        info!("running {:?} build '{}' ({} steps)",
              self.config.kind,
              self.config.build_name,
              runner.step_ids().len());
        let status = runner.run(&mut state)?;

        if let Some(err) = state.signals_mut().take_error() {
            return Err(err);
        }
        match status {
            RunStatus::Cancelled => return Err(BuildError::Cancelled),
            RunStatus::Halted => return Err(BuildError::Halted),
            _ => {}
        }

        let disk = state.disk
                        .take()
                        .ok_or_else(|| BuildError::precondition("build finished without producing a disk"))?;
        let name = format!("{} completed: {} {}",
                           self.config.name_prefix,
                           self.config.build_name,
                           Local::now().format("%Y-%m-%d %H:%M:%S"));
        // el disco ya está listo: sin rename igual es el artifact
        let disk = match client.disk_update(&disk.id, &UpdateDiskRequest::rename(name.as_str())) {
            Ok(renamed) => renamed,
            Err(e) => {
                warn!("could not rename disk {}: {e}", disk.id);
                host.ui.warn(&format!("error renaming disk {}: {e}", disk.id));
                disk
            }
        };
        host.ui.say(&format!("Build finished: {disk}"));
        Ok(Artifact::new(disk, self.config.kind.builder_id(), client))
    }
}
