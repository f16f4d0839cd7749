//! Transporte HTTP real sobre `reqwest` bloqueante.
//!
//! El orquestador es síncrono (un step a la vez, polls bloqueantes), por eso
//! se usa el cliente bloqueante y no uno async.

use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_LENGTH;
use serde_json::Value;

use crate::config::{ApiConfig, Credentials};
use crate::transport::{ApiResponse, Method, ProbeResponse, Transport, UrlProbe};
use crate::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client,
                  base_url: config.url.trim_end_matches('/').to_string(),
                  credentials: config.credentials.clone() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::AccessToken(token) => builder.bearer_auth(token),
            Credentials::Application { id, secret } => builder.basic_auth(id, Some(secret)),
        }
    }
}

impl Transport for HttpTransport {
    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {url}");
        let builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        let mut builder = self.authorize(builder);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let text = response.text()?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            // cuerpos no-JSON (p.ej. páginas de error de un proxy) se conservan como string
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        debug!("{method} {url} -> {status}");
        Ok(ApiResponse { status, body })
    }
}

impl UrlProbe for HttpTransport {
    fn head(&self, url: &str) -> Result<ProbeResponse, ApiError> {
        let response = self.client.head(url).send()?;
        let content_length = response.headers()
                                     .get(CONTENT_LENGTH)
                                     .and_then(|v| v.to_str().ok())
                                     .map(str::to_string);
        Ok(ProbeResponse { status: response.status().as_u16(),
                           content_length })
    }
}
