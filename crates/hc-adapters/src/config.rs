//! Configuración de un build.
//!
//! Se deserializa desde el build file JSON (`serde`, todos los campos con
//! default) y se valida en `prepare`, que junta todos los problemas en un
//! único `ConfigError::Invalid`. URL y credenciales de la API caen al
//! entorno (`HYPERCLOUD_*`, `.env`) cuando el build file no las trae.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hc_api::{ApiConfig, ApiError};
use hc_core::constants::{BOOT_MEDIA_MIN_SIZE, DEFAULT_WAIT_TIMEOUT, SHUTDOWN_POLL_INTERVAL, STATE_POLL_INTERVAL};
use hc_core::PollConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Qué pipeline arma el builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderKind {
    /// Clona un disco desde un template y lo aprovisiona por SSH.
    #[default]
    Clone,
    /// Instala desde boot media tipeando el boot command por VNC.
    Vnc,
}

impl BuilderKind {
    /// Id del builder que queda en el artifact.
    pub fn builder_id(self) -> &'static str {
        match self {
            BuilderKind::Clone => "hypercloud.clone.disk",
            BuilderKind::Vnc => "hypercloud.vnc.disk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    #[serde(rename = "type")]
    pub kind: BuilderKind,
    pub build_name: String,
    /// Nombre de la instancia; si falta se usa `build_name`.
    pub vm_name: String,
    /// Prefijo de los nombres de recursos remotos (`<prefix>: <vm_name>`).
    pub name_prefix: String,

    pub hypercloud_url: Option<String>,
    pub hypercloud_id: Option<String>,
    pub hypercloud_secret: Option<String>,
    pub hypercloud_access_token: Option<String>,

    pub template_id: String,
    pub template_slug: String,
    pub template_name: String,
    pub disk_performance_tier_id: String,
    pub instance_performance_tier_id: String,
    pub network_id: String,
    /// GB.
    pub disk_size: u64,
    /// MB.
    pub memory: u64,

    pub shutdown_from_api: bool,
    pub shutdown_command: String,
    pub shutdown_timeout_secs: u64,

    pub boot_command: Vec<String>,
    pub boot_disk_url: String,
    pub boot_disk_md5: String,
    pub downloader_vm_id: String,
    /// Piso de `Content-Length` (bytes) para aceptar la URL del boot media.
    pub boot_media_min_size: u64,
    pub key_interval_ms: u64,

    pub http_directory: Option<PathBuf>,
    pub http_ip: Option<String>,
    pub http_port_min: u16,
    pub http_port_max: u16,
    pub vnc_port_min: u16,
    pub vnc_port_max: u16,

    pub ssh_username: String,
    pub ssh_password: Option<String>,
    pub ssh_private_key_file: Option<PathBuf>,
    pub ssh_port: u16,
    pub ssh_timeout_secs: u64,

    pub state_poll_interval_ms: u64,
    pub shutdown_poll_interval_secs: u64,
    pub wait_timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { kind: BuilderKind::Clone,
               build_name: String::new(),
               vm_name: String::new(),
               name_prefix: "hcflow".into(),
               hypercloud_url: None,
               hypercloud_id: None,
               hypercloud_secret: None,
               hypercloud_access_token: None,
               template_id: String::new(),
               template_slug: String::new(),
               template_name: String::new(),
               disk_performance_tier_id: String::new(),
               instance_performance_tier_id: String::new(),
               network_id: String::new(),
               disk_size: 10,
               memory: 512,
               shutdown_from_api: false,
               shutdown_command: String::new(),
               shutdown_timeout_secs: 300,
               boot_command: Vec::new(),
               boot_disk_url: String::new(),
               boot_disk_md5: String::new(),
               downloader_vm_id: String::new(),
               boot_media_min_size: BOOT_MEDIA_MIN_SIZE,
               key_interval_ms: 100,
               http_directory: None,
               http_ip: None,
               http_port_min: 8000,
               http_port_max: 9000,
               vnc_port_min: 5900,
               vnc_port_max: 6000,
               ssh_username: "root".into(),
               ssh_password: None,
               ssh_private_key_file: None,
               ssh_port: 22,
               ssh_timeout_secs: 300,
               state_poll_interval_ms: STATE_POLL_INTERVAL.as_millis() as u64,
               shutdown_poll_interval_secs: SHUTDOWN_POLL_INTERVAL.as_secs(),
               wait_timeout_secs: DEFAULT_WAIT_TIMEOUT.as_secs() }
    }
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl BuildConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Aplica defaults derivados y valida. Devuelve la config de la API ya
    /// resuelta (build file primero, entorno después).
    pub fn prepare(&mut self) -> Result<ApiConfig, ConfigError> {
        if blank(&self.vm_name) {
            self.vm_name = self.build_name.clone();
        }
        if self.disk_size == 0 {
            self.disk_size = 10;
        }
        if self.memory == 0 {
            self.memory = 512;
        }
        if self.shutdown_timeout_secs == 0 {
            self.shutdown_timeout_secs = 300;
        }

        let mut errs = Vec::new();
        let api = match ApiConfig::with_env_fallback(self.hypercloud_url.as_deref(),
                                                     self.hypercloud_id.as_deref(),
                                                     self.hypercloud_secret.as_deref(),
                                                     self.hypercloud_access_token.as_deref())
        {
            Ok(api) => Some(api),
            Err(ApiError::Config(msg)) => {
                errs.push(msg);
                None
            }
            Err(other) => {
                errs.push(other.to_string());
                None
            }
        };

        if blank(&self.build_name) {
            errs.push("build_name is required".into());
        }
        if blank(&self.disk_performance_tier_id) {
            errs.push("disk_performance_tier_id is required".into());
        }
        if blank(&self.instance_performance_tier_id) {
            errs.push("instance_performance_tier_id is required".into());
        }
        if blank(&self.network_id) {
            errs.push("network_id is required".into());
        }
        if blank(&self.ssh_username) {
            errs.push("ssh_username is required".into());
        }

        match self.kind {
            BuilderKind::Clone => {
                if blank(&self.template_id) && blank(&self.template_slug) && blank(&self.template_name) {
                    errs.push("either template_id, template_slug or template_name is required".into());
                }
                if self.ssh_private_key_file.is_none() {
                    errs.push("ssh_private_key_file is required".into());
                }
            }
            BuilderKind::Vnc => {
                if self.boot_command.is_empty() {
                    errs.push("boot_command is required".into());
                }
                if blank(&self.boot_disk_url) {
                    errs.push("boot_disk_url is required".into());
                }
                if blank(&self.boot_disk_md5) {
                    errs.push("boot_disk_md5 is required".into());
                } else if self.boot_disk_md5.len() != 32 || !self.boot_disk_md5.chars().all(|c| c.is_ascii_hexdigit()) {
                    errs.push(format!("boot_disk_md5 is not an md5 hex digest: {}", self.boot_disk_md5));
                }
                if blank(&self.downloader_vm_id) {
                    errs.push("downloader_vm_id is required".into());
                }
                if self.http_port_min > self.http_port_max {
                    errs.push("http_port_min must be less than http_port_max".into());
                }
                if self.vnc_port_min >= self.vnc_port_max {
                    errs.push("vnc_port_min must be less than vnc_port_max".into());
                }
                if let Some(dir) = &self.http_directory {
                    if !dir.is_dir() {
                        errs.push(format!("http_directory is not a directory: {}", dir.display()));
                    }
                }
            }
        }

        match api {
            Some(api) if errs.is_empty() => Ok(api),
            _ => Err(ConfigError::Invalid(errs)),
        }
    }

    /// Nombre con el prefijo de recursos: `"<prefix>: <name>"`.
    pub fn resource_name(&self, name: &str) -> String {
        format!("{}: {name}", self.name_prefix)
    }

    pub fn state_poll(&self) -> PollConfig {
        PollConfig::new(Duration::from_millis(self.state_poll_interval_ms), self.wait_timeout())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn shutdown_poll(&self) -> PollConfig {
        PollConfig::new(Duration::from_secs(self.shutdown_poll_interval_secs), self.shutdown_timeout())
    }

    pub fn ssh_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_timeout_secs)
    }

    pub fn key_interval(&self) -> Duration {
        Duration::from_millis(self.key_interval_ms)
    }
}
