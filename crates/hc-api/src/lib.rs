//! hc-api
//!
//! Fachada tipada sobre la API de control de HyperCloud.
//!
//! Módulos:
//! - `transport`: contrato `Transport` (request JSON -> status + body) y
//!   `UrlProbe` (HEAD a URLs arbitrarias).
//! - `http`: implementación con `reqwest` bloqueante.
//! - `client`: `HyperCloudClient`, una operación por recurso; normaliza
//!   status fuera de `[200,300)` a `ApiError::Rejected` y convierte las
//!   operaciones asíncronas remotas en llamadas síncronas vía `hc_core::poll`.
//! - `memory`: API simulada en memoria (tests y demos sin red).
//! - `config`: URL y credenciales desde el entorno (`.env`).

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod requests;
pub mod transport;

pub use client::HyperCloudClient;
pub use config::{init_dotenv, ApiConfig, Credentials};
pub use error::ApiError;
pub use http::HttpTransport;
pub use memory::InMemoryHyperCloud;
pub use requests::{CreateDiskRequest, CreateInstanceRequest, UpdateDiskRequest};
pub use transport::{ApiResponse, Method, ProbeResponse, Transport, UrlProbe};
