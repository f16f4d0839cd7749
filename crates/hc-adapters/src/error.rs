//! Errores de un build.
//!
//! `BuildError` es lo que un step escribe en la ranura `error` del estado y
//! lo que `Builder::run` devuelve al host. Los timeouts de la API se
//! re-exponen como variante propia para que el host pueda distinguirlos.

use std::io;
use std::time::Duration;

use hc_api::ApiError;
use hc_core::{CoreEngineError, PollError};
use hc_vnc::VncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Api(ApiError),
    #[error("timed out after {elapsed:?} waiting for {resource} to be {desired}")]
    Timeout { resource: String, desired: String, elapsed: Duration },
    #[error("{0}")]
    Precondition(String),
    #[error("communicator error: {0}")]
    Communicator(String),
    #[error(transparent)]
    Vnc(#[from] VncError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("error preparing boot command: {0}")]
    Template(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] CoreEngineError),
    #[error("build was cancelled")]
    Cancelled,
    #[error("build was halted")]
    Halted,
}

impl BuildError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }
}

impl From<ApiError> for BuildError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Timeout { resource, desired, elapsed } => Self::Timeout { resource, desired, elapsed },
            other => Self::Api(other),
        }
    }
}

impl From<PollError<BuildError>> for BuildError {
    fn from(err: PollError<BuildError>) -> Self {
        match err {
            PollError::Fetch(inner) => inner,
            PollError::Timeout { resource, desired, elapsed } => Self::Timeout { resource, desired, elapsed },
        }
    }
}

/// Problemas del build file, todos juntos.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid build configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("could not read build file: {0}")]
    Read(String),
    #[error("could not parse build file: {0}")]
    Parse(String),
}
