use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
}

impl PublicKey {
    /// Igualdad de material de clave ignorando espacios al inicio y al final.
    pub fn same_material(&self, local: &str) -> bool {
        self.key.trim() == local.trim()
    }
}
