//! Errores de la fachada.
//! Mapea fallas de transporte, rechazos remotos y timeouts de polling a
//! variantes semánticas.

use std::time::Duration;

use hc_core::PollError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("timed out after {elapsed:?} waiting for {resource} to be {desired}")]
    Timeout { resource: String, desired: String, elapsed: Duration },
    #[error("invalid api configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Status remoto si la API rechazó la llamada.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<PollError<ApiError>> for ApiError {
    fn from(err: PollError<ApiError>) -> Self {
        match err {
            PollError::Fetch(inner) => inner,
            PollError::Timeout { resource, desired, elapsed } => Self::Timeout { resource, desired, elapsed },
        }
    }
}
