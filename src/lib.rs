//! hcflow: lado host de los builders de HyperCloud.
//!
//! Este crate arma lo que el orquestador (`hc-adapters`) espera del host:
//! - `config`: el build file (config del builder + comandos a aprovisionar).
//! - `ssh`: `CommunicatorFactory` sobre el cliente `ssh` de OpenSSH.
//! - `HostError`: lo que el binario reporta antes de salir.

pub mod config;
pub mod ssh;

use hc_adapters::{BuildError, ConfigError};
use thiserror::Error;

pub use config::BuildFile;
pub use ssh::{OpenSshCommunicator, OpenSshFactory};

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("build failed: {0}")]
    Build(#[from] BuildError),
}

impl HostError {
    /// Exit code del proceso: 2 configuración, 3 cancelado, 1 el resto.
    pub fn exit_code(&self) -> i32 {
        match self {
            HostError::Config(_) => 2,
            HostError::Build(BuildError::Cancelled) => 3,
            HostError::Build(_) => 1,
        }
    }
}
