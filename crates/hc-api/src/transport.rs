//! Contrato de transporte de la fachada.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        Method::Get => "GET",
                        Method::Post => "POST",
                        Method::Put => "PUT",
                        Method::Delete => "DELETE",
                    })
    }
}

/// Respuesta cruda: status HTTP y body decodificado (`Null` si vino vacío).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Envía un request JSON a un path relativo a la URL base de la API.
///
/// Un `Err` significa que la API no fue alcanzable; cualquier status (incluso
/// 500) vuelve como `Ok` y la fachada decide.
pub trait Transport {
    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse, ApiError>;
}

/// Resultado de un HEAD contra una URL externa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    /// Valor crudo del header `Content-Length`, si vino.
    pub content_length: Option<String>,
}

/// HEAD contra URLs fuera de la API (p.ej. la URL del boot media).
pub trait UrlProbe {
    fn head(&self, url: &str) -> Result<ProbeResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse, ApiError> {
        (**self).request(method, path, body)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse, ApiError> {
        (**self).request(method, path, body)
    }
}

impl<T: UrlProbe + ?Sized> UrlProbe for Arc<T> {
    fn head(&self, url: &str) -> Result<ProbeResponse, ApiError> {
        (**self).head(url)
    }
}

impl<T: UrlProbe + ?Sized> UrlProbe for &T {
    fn head(&self, url: &str) -> Result<ProbeResponse, ApiError> {
        (**self).head(url)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse, ApiError> {
        (**self).request(method, path, body)
    }
}

impl<T: UrlProbe + ?Sized> UrlProbe for Box<T> {
    fn head(&self, url: &str) -> Result<ProbeResponse, ApiError> {
        (**self).head(url)
    }
}
