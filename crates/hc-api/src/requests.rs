//! Cuerpos de request tipados.

use hc_domain::BootDevice;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateDiskRequest {
    pub name: String,
    pub size: u64,
    pub region: String,
    pub performance_tier: String,
    /// Si está presente, el disco se clona desde ese template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl CreateDiskRequest {
    pub fn blank(name: impl Into<String>, size: u64, region: impl Into<String>, tier: impl Into<String>) -> Self {
        Self { name: name.into(),
               size,
               region: region.into(),
               performance_tier: tier.into(),
               template: None }
    }

    pub fn from_template(mut self, template_id: impl Into<String>) -> Self {
        self.template = Some(template_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UpdateDiskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdrom: Option<bool>,
}

impl UpdateDiskRequest {
    pub fn rename(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()),
               ..Self::default() }
    }

    pub fn cdrom(cdrom: bool) -> Self {
        Self { cdrom: Some(cdrom),
               ..Self::default() }
    }
}

/// Instancia HVM que arranca de `boot_device`, reinicia ante reboot y queda
/// apagada ante shutdown o crash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateInstanceRequest {
    pub name: String,
    pub memory: u64,
    pub performance_tier: String,
    pub region: String,
    pub boot_device: BootDevice,
    pub disks: Vec<String>,
    pub ip_addresses: Vec<String>,
    pub virtualization: String,
    pub start_on_shutdown: bool,
    pub start_on_reboot: bool,
    pub start_on_crash: bool,
}

impl CreateInstanceRequest {
    pub fn new(name: impl Into<String>,
               memory: u64,
               tier: impl Into<String>,
               region: impl Into<String>,
               boot_device: BootDevice)
               -> Self {
        Self { name: name.into(),
               memory,
               performance_tier: tier.into(),
               region: region.into(),
               boot_device,
               disks: Vec::new(),
               ip_addresses: Vec::new(),
               virtualization: "hvm".to_string(),
               start_on_shutdown: false,
               start_on_reboot: true,
               start_on_crash: false }
    }

    pub fn disk(mut self, id: impl Into<String>) -> Self {
        self.disks.push(id.into());
        self
    }

    pub fn ip(mut self, id: impl Into<String>) -> Self {
        self.ip_addresses.push(id.into());
        self
    }
}
