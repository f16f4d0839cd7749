//! Carga de URL y credenciales de la API desde variables de entorno.
//! Convención `HYPERCLOUD_URL` + (`HYPERCLOUD_ID`/`HYPERCLOUD_SECRET` o
//! `HYPERCLOUD_ACCESS_TOKEN`). Los valores explícitos del build file tienen
//! prioridad sobre el entorno.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::ApiError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const ENV_URL: &str = "HYPERCLOUD_URL";
pub const ENV_ID: &str = "HYPERCLOUD_ID";
pub const ENV_SECRET: &str = "HYPERCLOUD_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "HYPERCLOUD_ACCESS_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Token ya emitido; se envía como bearer.
    AccessToken(String),
    /// Aplicación id/secret; se envía como basic auth.
    Application { id: String, secret: String },
}

impl Credentials {
    /// Resuelve las credenciales: el par id/secret gana si alguno de los dos
    /// está presente (y entonces ambos son obligatorios); si no, el token.
    pub fn resolve(id: Option<&str>, secret: Option<&str>, token: Option<&str>) -> Result<Self, ApiError> {
        let id = id.filter(|s| !s.is_empty());
        let secret = secret.filter(|s| !s.is_empty());
        match (id, secret) {
            (Some(id), Some(secret)) => Ok(Self::Application { id: id.to_string(),
                                                               secret: secret.to_string() }),
            (None, Some(_)) => Err(ApiError::Config("hypercloud_id is required when hypercloud_secret is provided".into())),
            (Some(_), None) => Err(ApiError::Config("hypercloud_secret is required when hypercloud_id is provided".into())),
            (None, None) => match token.filter(|s| !s.is_empty()) {
                Some(token) => Ok(Self::AccessToken(token.to_string())),
                None => Err(ApiError::Config("either hypercloud_access_token or both hypercloud_id and hypercloud_secret are required".into())),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub url: String,
    pub credentials: Credentials,
}

impl ApiConfig {
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        Self { url: url.into(),
               credentials }
    }

    /// Toma todo del entorno.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::with_env_fallback(None, None, None, None)
    }

    /// Usa los valores dados y completa los faltantes desde el entorno.
    pub fn with_env_fallback(url: Option<&str>,
                             id: Option<&str>,
                             secret: Option<&str>,
                             token: Option<&str>)
                             -> Result<Self, ApiError> {
        Lazy::force(&DOTENV_LOADED);
        let pick = |given: Option<&str>, var: &str| {
            given.filter(|s| !s.is_empty()).map(str::to_string).or_else(|| env::var(var).ok())
        };
        let url = pick(url, ENV_URL).filter(|u| !u.is_empty())
                                    .ok_or_else(|| ApiError::Config("hypercloud_url is required".into()))?;
        let id = pick(id, ENV_ID);
        let secret = pick(secret, ENV_SECRET);
        let token = pick(token, ENV_ACCESS_TOKEN);
        let credentials = Credentials::resolve(id.as_deref(), secret.as_deref(), token.as_deref())?;
        Ok(Self { url, credentials })
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_pair_wins_over_token() {
        let c = Credentials::resolve(Some("app"), Some("s3cr3t"), Some("tok")).expect("credenciales válidas");
        assert_eq!(c,
                   Credentials::Application { id: "app".into(),
                                              secret: "s3cr3t".into() });
    }

    #[test]
    fn half_a_pair_is_rejected() {
        assert!(Credentials::resolve(Some("app"), None, Some("tok")).is_err());
        assert!(Credentials::resolve(None, Some("s"), None).is_err());
    }

    #[test]
    fn token_alone_is_enough() {
        assert_eq!(Credentials::resolve(None, Some(""), Some("tok")),
                   Ok(Credentials::AccessToken("tok".into())));
        assert!(Credentials::resolve(None, None, None).is_err());
    }
}
