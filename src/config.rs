//! Build file del binario.
//!
//! Es el JSON de `BuildConfig` (mismos campos, planos) más la lista
//! `provision` de comandos de shell que corren por SSH entre el boot y el
//! apagado:
//!
//! ```json
//! { "type": "clone", "build_name": "web", "template_slug": "ubuntu-22.04",
//!   "provision": ["apt-get update", "apt-get -y upgrade"] }
//! ```

use std::fs;
use std::path::Path;

use hc_adapters::{BuildConfig, ConfigError};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BuildFile {
    #[serde(flatten)]
    pub builder: BuildConfig,
    #[serde(default)]
    pub provision: Vec<String>,
}

impl BuildFile {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }
}
