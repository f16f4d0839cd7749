use serde::{Deserialize, Serialize};
use std::fmt;

use crate::disk::DiskState;
use crate::network::IpAddress;
use crate::template::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Creating,
    Stopped,
    Starting,
    Running,
    Stopping,
    Terminated,
    #[serde(other)]
    Unknown,
}

impl InstanceState {
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceState::Creating => "creating",
            InstanceState::Stopped => "stopped",
            InstanceState::Starting => "starting",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Terminated => "terminated",
            InstanceState::Unknown => "unknown",
        }
    }
}

impl AsRef<str> for InstanceState {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispositivo de arranque de una instancia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootDevice {
    Disk,
    Cdrom,
}

/// Disco tal como aparece adjunto a una instancia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDisk {
    pub id: String,
    pub state: DiskState,
    /// Slot de attach; sin él no hay device en el guest.
    pub position: Option<u32>,
}

impl InstanceDisk {
    /// Posición de attach -> device del guest Xen (0 = /dev/xvda).
    pub fn device_path(&self) -> Option<String> {
        let letter = u8::try_from(self.position?).ok().filter(|p| *p < 26)?;
        Some(format!("/dev/xvd{}", (b'a' + letter) as char))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAdapter {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub performance_tier: Option<String>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub disks: Vec<InstanceDisk>,
    #[serde(default)]
    pub network_adapters: Vec<NetworkAdapter>,
    pub state: InstanceState,
    #[serde(default)]
    pub boot_device: Option<BootDevice>,
}

impl Instance {
    pub fn disk_ids(&self) -> Vec<String> {
        self.disks.iter().map(|d| d.id.clone()).collect()
    }

    pub fn find_disk(&self, disk_id: &str) -> Option<&InstanceDisk> {
        self.disks.iter().find(|d| d.id == disk_id)
    }

    /// `true` mientras algún disco está en attach/detach en vivo.
    pub fn has_settling_disks(&self) -> bool {
        self.disks.iter().any(|d| d.state.is_settling())
    }

    /// Primera IP del primer adaptador.
    pub fn primary_address(&self) -> Option<&str> {
        self.network_adapters
            .first()
            .and_then(|a| a.ip_addresses.first())
            .map(|ip| ip.address.as_str())
    }
}
