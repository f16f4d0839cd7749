use serde::{Deserialize, Serialize};
use std::fmt;

/// Región tal como la embebe la API dentro de otros recursos.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.name, self.id)
        }
    }
}

/// Tier de performance (disco o instancia); sólo lectura.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceTier {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub region: Region,
}

/// Imagen base desde la que se clona un disco.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub version: f64,
    pub region: Region,
}

impl Template {
    /// `true` si el template coincide por id, slug o nombre (los vacíos no
    /// coinciden nunca).
    pub fn matches(&self, id: &str, slug: &str, name: &str) -> bool {
        (!id.is_empty() && self.id == id)
        || (!slug.is_empty() && self.slug == slug)
        || (!name.is_empty() && self.name == name)
    }

    /// Selecciona el template de mayor versión en `region_id` que coincida.
    ///
    /// El orden de la lista no importa; ante versiones iguales gana el primero.
    pub fn select_newest<'a>(templates: &'a [Template],
                             region_id: &str,
                             id: &str,
                             slug: &str,
                             name: &str)
                             -> Option<&'a Template> {
        templates.iter()
                 .filter(|t| t.region.id == region_id && t.matches(id, slug, name))
                 .fold(None, |best: Option<&Template>, t| match best {
                     Some(b) if b.version >= t.version => Some(b),
                     _ => Some(t),
                 })
    }
}
