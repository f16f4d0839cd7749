//! Errores específicos del core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreEngineError {
    #[error("step '{step}' requires state '{key}' which is not populated")]
    MissingState { step: String, key: String },
    #[error("run already executed (a runner is single-use)")] AlreadyRun,
    #[error("internal: {0}")] Internal(String),
}
