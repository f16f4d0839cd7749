//! Resultado de un build: el disco producido.

use std::fmt;
use std::sync::Arc;

use hc_domain::Disk;

use crate::error::BuildError;
use crate::state::Client;

pub struct Artifact {
    disk: Disk,
    builder_id: &'static str,
    client: Arc<Client>,
}

impl Artifact {
    pub fn new(disk: Disk, builder_id: &'static str, client: Arc<Client>) -> Self {
        Self { disk,
               builder_id,
               client }
    }

    pub fn id(&self) -> &str {
        &self.disk.id
    }

    pub fn builder_id(&self) -> &'static str {
        self.builder_id
    }

    pub fn disk(&self) -> &Disk {
        &self.disk
    }

    /// `Disk: <id> : <name>`.
    pub fn label(&self) -> String {
        self.disk.to_string()
    }

    /// Borra el disco remoto.
    pub fn destroy(self) -> Result<(), BuildError> {
        self.client.disk_delete(&self.disk.id)?;
        Ok(())
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
         .field("disk", &self.disk)
         .field("builder_id", &self.builder_id)
         .finish()
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
