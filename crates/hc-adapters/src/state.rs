//! Estado tipado de un build.
//!
//! Un campo `Option` por recurso producible; `StateKey` los nombra para que
//! cada step declare lo que necesita y el runner lo verifique antes de
//! ejecutarlo. Los accesores `*_ref` fallan con `MissingState` en vez de
//! entrar en pánico.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use hc_api::{HyperCloudClient, Transport, UrlProbe};
use hc_core::{CancelToken, CoreEngineError, RunSignals, StepState};
use hc_domain::{ConsoleSession, Disk, Instance, IpAddress, Network, Region};
use indexmap::IndexMap;

use crate::communicator::{Communicator, CommunicatorFactory, SshTarget};
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::ui::Ui;

/// Transporte completo que necesita un build: API + HEAD a URLs externas.
pub trait ApiTransport: Transport + UrlProbe + Send + Sync {}

impl<T: Transport + UrlProbe + Send + Sync> ApiTransport for T {}

pub type Client = HyperCloudClient<Box<dyn ApiTransport>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    Region,
    Disk,
    BootDisk,
    Ip,
    Network,
    Instance,
    ConsoleSession,
    VncProxy,
    HttpPort,
    Communicator,
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        StateKey::Region => "region",
                        StateKey::Disk => "disk",
                        StateKey::BootDisk => "boot_disk",
                        StateKey::Ip => "ip",
                        StateKey::Network => "network",
                        StateKey::Instance => "instance",
                        StateKey::ConsoleSession => "console_session",
                        StateKey::VncProxy => "vnc_proxy",
                        StateKey::HttpPort => "http_port",
                        StateKey::Communicator => "communicator",
                    })
    }
}

pub struct BuildState {
    pub config: BuildConfig,
    pub client: Arc<Client>,
    pub ui: Arc<dyn Ui>,
    pub cancel: CancelToken,
    pub communicators: Arc<dyn CommunicatorFactory>,

    pub region: Option<Region>,
    pub disk: Option<Disk>,
    pub boot_disk: Option<Disk>,
    pub ip: Option<IpAddress>,
    pub network: Option<Network>,
    pub instance: Option<Instance>,
    pub console: Option<ConsoleSession>,
    pub vnc_proxy: Option<SocketAddr>,
    pub http_port: Option<u16>,
    pub communicator: Option<Box<dyn Communicator>>,
    /// Variables del boot command (`HTTPIP`, `HTTPPort`, `Name`, `HYPERCLOUD_*`).
    pub template_vars: IndexMap<String, String>,

    signals: RunSignals<BuildError>,
}

fn missing(key: StateKey) -> BuildError {
    BuildError::Engine(CoreEngineError::MissingState { step: "-".into(),
                                                       key: key.to_string() })
}

impl BuildState {
    pub fn new(config: BuildConfig,
               client: Arc<Client>,
               ui: Arc<dyn Ui>,
               cancel: CancelToken,
               communicators: Arc<dyn CommunicatorFactory>)
               -> Self {
        let mut template_vars = IndexMap::new();
        template_vars.insert("Name".to_string(), config.vm_name.clone());
        Self { config,
               client,
               ui,
               cancel,
               communicators,
               region: None,
               disk: None,
               boot_disk: None,
               ip: None,
               network: None,
               instance: None,
               console: None,
               vnc_proxy: None,
               http_port: None,
               communicator: None,
               template_vars,
               signals: RunSignals::default() }
    }

    pub fn set_var(&mut self, name: &str, value: impl Into<String>) {
        self.template_vars.insert(name.to_string(), value.into());
    }

    pub fn region_ref(&self) -> Result<&Region, BuildError> {
        self.region.as_ref().ok_or_else(|| missing(StateKey::Region))
    }

    pub fn disk_ref(&self) -> Result<&Disk, BuildError> {
        self.disk.as_ref().ok_or_else(|| missing(StateKey::Disk))
    }

    pub fn boot_disk_ref(&self) -> Result<&Disk, BuildError> {
        self.boot_disk.as_ref().ok_or_else(|| missing(StateKey::BootDisk))
    }

    pub fn ip_ref(&self) -> Result<&IpAddress, BuildError> {
        self.ip.as_ref().ok_or_else(|| missing(StateKey::Ip))
    }

    pub fn instance_ref(&self) -> Result<&Instance, BuildError> {
        self.instance.as_ref().ok_or_else(|| missing(StateKey::Instance))
    }

    pub fn console_ref(&self) -> Result<&ConsoleSession, BuildError> {
        self.console.as_ref().ok_or_else(|| missing(StateKey::ConsoleSession))
    }

    pub fn vnc_proxy_addr(&self) -> Result<SocketAddr, BuildError> {
        self.vnc_proxy.ok_or_else(|| missing(StateKey::VncProxy))
    }

    pub fn communicator_mut(&mut self) -> Result<&mut (dyn Communicator + 'static), BuildError> {
        self.communicator.as_deref_mut().ok_or_else(|| missing(StateKey::Communicator))
    }

    /// Credenciales SSH del build contra `host`.
    pub fn ssh_target(&self, host: &str) -> SshTarget {
        SshTarget { host: host.to_string(),
                    port: self.config.ssh_port,
                    username: self.config.ssh_username.clone(),
                    password: self.config.ssh_password.clone(),
                    private_key_file: self.config.ssh_private_key_file.clone() }
    }

    /// Registra el error, lo muestra y pide detener el flujo.
    pub fn fail(&mut self, err: BuildError) {
        self.ui.error(&err.to_string());
        self.signals.fail(err);
    }
}

impl StepState for BuildState {
    type Key = StateKey;
    type Error = BuildError;

    fn contains(&self, key: StateKey) -> bool {
        match key {
            StateKey::Region => self.region.is_some(),
            StateKey::Disk => self.disk.is_some(),
            StateKey::BootDisk => self.boot_disk.is_some(),
            StateKey::Ip => self.ip.is_some(),
            StateKey::Network => self.network.is_some(),
            StateKey::Instance => self.instance.is_some(),
            StateKey::ConsoleSession => self.console.is_some(),
            StateKey::VncProxy => self.vnc_proxy.is_some(),
            StateKey::HttpPort => self.http_port.is_some(),
            StateKey::Communicator => self.communicator.is_some(),
        }
    }

    fn signals(&self) -> &RunSignals<BuildError> {
        &self.signals
    }

    fn signals_mut(&mut self) -> &mut RunSignals<BuildError> {
        &mut self.signals
    }
}
