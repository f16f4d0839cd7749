use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub netmask: String,
    #[serde(default)]
    pub gateway: String,
    /// Notación `a.b.c.d/nn`.
    #[serde(default)]
    pub specification: String,
}

impl Network {
    /// Largo de prefijo tomado de `specification` (`10.0.0.0/24` -> `24`).
    pub fn cidr(&self) -> Result<&str, DomainError> {
        match self.specification.split_once('/') {
            Some((_, prefix)) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => Ok(prefix),
            _ => Err(DomainError::ValidationError(format!("network {} has no CIDR prefix in '{}'",
                                                          self.id, self.specification))),
        }
    }
}
