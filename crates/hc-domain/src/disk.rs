use serde::{Deserialize, Serialize};
use std::fmt;

use crate::template::Region;

/// Estados que la API reporta para un disco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskState {
    Creating,
    #[serde(rename = "creation in progress")]
    CreationInProgress,
    Unattached,
    Attaching,
    Attached,
    Detaching,
    #[serde(other)]
    Unknown,
}

impl DiskState {
    pub fn as_str(self) -> &'static str {
        match self {
            DiskState::Creating => "creating",
            DiskState::CreationInProgress => "creation in progress",
            DiskState::Unattached => "unattached",
            DiskState::Attaching => "attaching",
            DiskState::Attached => "attached",
            DiskState::Detaching => "detaching",
            DiskState::Unknown => "unknown",
        }
    }

    /// Attach/detach en vivo todavía no asentado.
    pub fn is_settling(self) -> bool {
        matches!(self, DiskState::Attaching | DiskState::Detaching)
    }
}

impl AsRef<str> for DiskState {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for DiskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub region: Region,
    #[serde(default)]
    pub performance_tier: Option<String>,
    pub state: DiskState,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub cdrom: bool,
}

impl Disk {
    /// Etiqueta de checksum embebida en el nombre de los discos de boot media.
    pub fn md5_tag(md5: &str) -> String {
        format!("md5={md5}")
    }

    /// Búsqueda de boot media: substring case-sensitive en el nombre y misma región.
    pub fn is_boot_media_for(&self, md5: &str, region_id: &str) -> bool {
        self.region.id == region_id && self.name.contains(&Self::md5_tag(md5))
    }
}

impl fmt::Display for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Disk: {} : {}", self.id, self.name)
    }
}
